//! Names of the generated items.
//!
//! All functions are pure: the same service and method names always
//! produce the same identifiers. `service` is the Rust style service name,
//! `method` the method name as declared in the service definition.

use heck::ToSnakeCase;

/// Uppercase the first character of `s`, leaving the rest untouched.
#[must_use]
pub fn export(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character of `s`, leaving the rest untouched.
#[must_use]
pub fn unexport(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `{Service}_{Method}_FullMethodName`
#[must_use]
pub fn full_method_const(service: &str, method: &str) -> String {
    format!("{service}_{method}_FullMethodName")
}

/// `_{Service}_{Method}_RestHandler`
#[must_use]
pub fn handler_fn(service: &str, method: &str) -> String {
    format!("_{service}_{method}_RestHandler")
}

/// `unexport({Service}{Method}Client)`, the legacy client stream wrapper.
#[must_use]
pub fn legacy_client_stream_type(service: &str, method: &str) -> String {
    unexport(&format!("{service}{method}Client"))
}

/// `{Service}_{Method}Client`, the client stream trait (legacy)
/// or alias (generic).
#[must_use]
pub fn client_stream_name(service: &str, method: &str) -> String {
    format!("{service}_{method}Client")
}

/// `{Service}_{Method}Server`, the legacy server stream alias.
#[must_use]
pub fn server_stream_name(service: &str, method: &str) -> String {
    format!("{service}_{method}Server")
}

/// `{Service}RestServiceDesc`
#[must_use]
pub fn service_desc_fn(service: &str) -> String {
    format!("{service}RestServiceDesc")
}

/// `{Service}Server`
#[must_use]
pub fn server_trait(service: &str) -> String {
    format!("{service}Server")
}

/// `export({Service})Client`
#[must_use]
pub fn client_struct(service: &str) -> String {
    format!("{}Client", export(service))
}

/// `{Service}_StreamDesc`
#[must_use]
pub fn stream_desc_table(service: &str) -> String {
    format!("{service}_StreamDesc")
}

/// `{service_snake}_rest_client`
#[must_use]
pub fn client_module(service: &str) -> String {
    format!("{}_rest_client", service.to_snake_case())
}

/// `{service_snake}_rest_server`
#[must_use]
pub fn server_module(service: &str) -> String {
    format!("{}_rest_server", service.to_snake_case())
}

/// `{package}.{Service}`, or `{Service}` when the package is empty
/// or not emitted.
#[must_use]
pub fn full_service_name(package: &str, service: &str, emit_package: bool) -> String {
    if emit_package && !package.is_empty() {
        format!("{package}.{service}")
    } else {
        service.to_owned()
    }
}

/// `/{package}.{Service}/{Method}`, the value of the full-method constant.
#[must_use]
pub fn full_method(package: &str, service: &str, method: &str, emit_package: bool) -> String {
    format!(
        "/{}/{method}",
        full_service_name(package, service, emit_package)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_unexport_ascii() {
        assert_eq!(export("greeter"), "Greeter");
        assert_eq!(unexport("GreeterSayHelloClient"), "greeterSayHelloClient");
        assert_eq!(export(""), "");
        assert_eq!(unexport(""), "");
        assert_eq!(unexport("already"), "already");
    }

    #[test]
    fn export_unexport_multi_byte() {
        assert_eq!(unexport("ÉcoleClient"), "écoleClient");
        assert_eq!(export("école"), "École");
        assert_eq!(unexport("Δelta"), "δelta");
        // no case mapping
        assert_eq!(unexport("日本Client"), "日本Client");
    }

    #[test]
    fn fixed_schemes() {
        assert_eq!(
            full_method_const("Greeter", "SayHello"),
            "Greeter_SayHello_FullMethodName"
        );
        assert_eq!(handler_fn("Greeter", "SayHello"), "_Greeter_SayHello_RestHandler");
        assert_eq!(
            legacy_client_stream_type("Greeter", "ListItems"),
            "greeterListItemsClient"
        );
        assert_eq!(client_stream_name("Chat", "Stream"), "Chat_StreamClient");
        assert_eq!(server_stream_name("Chat", "Stream"), "Chat_StreamServer");
        assert_eq!(service_desc_fn("Greeter"), "GreeterRestServiceDesc");
        assert_eq!(server_trait("Greeter"), "GreeterServer");
        assert_eq!(client_struct("greeter"), "GreeterClient");
        assert_eq!(stream_desc_table("Chat"), "Chat_StreamDesc");
        assert_eq!(client_module("ItemStore"), "item_store_rest_client");
        assert_eq!(server_module("ItemStore"), "item_store_rest_server");
    }

    #[test]
    fn full_method_value() {
        assert_eq!(
            full_method("helloworld", "Greeter", "SayHello", true),
            "/helloworld.Greeter/SayHello"
        );
        assert_eq!(
            full_method("helloworld", "Greeter", "SayHello", false),
            "/Greeter/SayHello"
        );
        assert_eq!(full_method("", "Greeter", "SayHello", true), "/Greeter/SayHello");
    }

    #[test]
    fn distinct_pairs_give_distinct_names() {
        let pairs = [
            ("Greeter", "SayHello"),
            ("Greeter", "SayGoodbye"),
            ("Chat", "SayHello"),
            ("Chat", "Stream"),
        ];
        for (i, a) in pairs.iter().enumerate() {
            for b in &pairs[i + 1..] {
                assert_ne!(handler_fn(a.0, a.1), handler_fn(b.0, b.1));
                assert_ne!(full_method_const(a.0, a.1), full_method_const(b.0, b.1));
                assert_ne!(
                    legacy_client_stream_type(a.0, a.1),
                    legacy_client_stream_type(b.0, b.1)
                );
            }
        }
    }
}
