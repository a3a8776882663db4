//! Route table assembly.
//!
//! A route table holds one [`RouteEntry`] per HTTP binding of every unary
//! method of a service. Streaming methods never get a route, they are
//! dispatched by name through the stream handlers of the service descriptor.

use tracing::{trace, warn};

use crate::{HttpVerb, Method, Service, StreamShape, naming};

/// A single route of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// HTTP verb of the route.
    pub verb: HttpVerb,
    /// Path template of the route.
    pub path: String,
    /// Description derived from the method documentation.
    pub description: String,
    /// Name of the generated handler function.
    pub handler: String,
    /// Name of the method, as declared in the service.
    pub method_name: String,
    /// The method is marked deprecated.
    pub deprecated: bool,
}

/// All routes of a service, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Full name of the service, `{package}.{Service}`.
    pub service_name: String,
    /// Name of the server trait.
    pub handler_type: String,
    /// Routes, ordered by method and then by binding.
    pub entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Assemble the route table of `service`.
    pub fn assemble<S: Service>(service: &S, emit_package: bool) -> Self {
        let mut entries = Vec::new();

        for method in service.methods() {
            let bindings = method.http_bindings();
            if StreamShape::of(method).is_streaming() {
                if !bindings.is_empty() {
                    warn!(
                        "{}.{}: ignoring {} http binding(s) on streaming method",
                        service.identifier(),
                        method.identifier(),
                        bindings.len()
                    );
                }
                continue;
            }

            let description = describe(method.comment());
            let handler = naming::handler_fn(service.name(), method.identifier());
            for binding in bindings {
                trace!(
                    "{}.{}: route {} {}",
                    service.identifier(),
                    method.identifier(),
                    binding.verb(),
                    binding.path()
                );
                entries.push(RouteEntry {
                    verb: binding.verb(),
                    path: binding.path().to_owned(),
                    description: description.clone(),
                    handler: handler.clone(),
                    method_name: method.identifier().to_owned(),
                    deprecated: method.deprecated(),
                });
            }
        }

        Self {
            service_name: naming::full_service_name(
                service.package(),
                service.identifier(),
                emit_package,
            ),
            handler_type: naming::server_trait(service.name()),
            entries,
        }
    }

    /// Routes of the method named `method_name`.
    pub fn entries_for<'a>(&'a self, method_name: &'a str) -> impl Iterator<Item = &'a RouteEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.method_name == method_name)
    }
}

/// Route description from documentation lines: each line loses its
/// `//` marker and one leading space, lines are joined with `,` and the
/// last one ends with `.`. No documentation gives an empty description.
#[must_use]
pub fn describe<C: AsRef<str>>(comments: &[C]) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let mut description = comments
        .iter()
        .map(|line| {
            let line = line.as_ref();
            let line = line.strip_prefix("//").unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join(",");
    description.push('.');
    description
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::manual::{RamaRestMethod, Service as ManualService};

    fn method(name: &str) -> crate::manual::RamaRestMethodBuilder {
        RamaRestMethod::builder()
            .with_name(name.to_lowercase())
            .with_route_name(name)
            .with_input_type("()")
            .with_output_type("()")
    }

    #[test]
    fn describe_lines() {
        assert_eq!(describe::<&str>(&[]), "");
        assert_eq!(describe(&[" Sends a greeting"]), "Sends a greeting.");
        assert_eq!(
            describe(&["// first line", "//second", " third"]),
            "first line,second,third."
        );
        assert_eq!(describe(&["  indented"]), " indented.");
    }

    #[test]
    fn greeter_single_get() {
        let service = ManualService::builder()
            .with_name("Greeter")
            .with_package("helloworld")
            .with_method(
                method("SayHello")
                    .with_comment(" Sends a greeting")
                    .with_get("/v1/hello")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let table = RouteTable::assemble(&service, true);
        assert_eq!(table.service_name, "helloworld.Greeter");
        assert_eq!(table.handler_type, "GreeterServer");
        assert_eq!(
            table.entries,
            vec![RouteEntry {
                verb: HttpVerb::Get,
                path: "/v1/hello".to_owned(),
                description: "Sends a greeting.".to_owned(),
                handler: "_Greeter_SayHello_RestHandler".to_owned(),
                method_name: "SayHello".to_owned(),
                deprecated: false,
            }]
        );
    }

    #[test]
    fn one_entry_per_binding_in_order() {
        let service = ManualService::builder()
            .with_name("Items")
            .with_package("store")
            .with_method(
                method("Get")
                    .with_get("/v1/items/{id}")
                    .with_get("/v1/items:get")
                    .with_post("/v1/items/{id}:get")
                    .build()
                    .unwrap(),
            )
            .with_method(method("Ping").build().unwrap())
            .with_method(
                method("Remove")
                    .with_deprecated()
                    .with_delete("/v1/items/{id}")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let table = RouteTable::assemble(&service, false);
        assert_eq!(table.service_name, "Items");

        let get = table.entries_for("Get").collect::<Vec<_>>();
        assert_eq!(get.len(), 3);
        assert_eq!(
            get.iter().map(|e| (e.verb, e.path.as_str())).collect::<Vec<_>>(),
            vec![
                (HttpVerb::Get, "/v1/items/{id}"),
                (HttpVerb::Get, "/v1/items:get"),
                (HttpVerb::Post, "/v1/items/{id}:get"),
            ]
        );
        assert!(get.iter().all(|e| e.handler == "_Items_Get_RestHandler"));

        assert_eq!(table.entries_for("Ping").count(), 0);

        let remove = table.entries_for("Remove").collect::<Vec<_>>();
        assert_eq!(remove.len(), 1);
        assert!(remove[0].deprecated);
        assert_eq!(remove[0].description, "");

        let order = table
            .entries
            .iter()
            .map(|e| e.method_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["Get", "Get", "Get", "Remove"]);
    }

    #[test]
    #[traced_test]
    fn streaming_methods_have_no_routes() {
        let service = ManualService::builder()
            .with_name("Chat")
            .with_package("chat")
            .with_method(
                method("Stream")
                    .with_client_streaming()
                    .with_server_streaming()
                    .with_post("/v1/chat")
                    .build()
                    .unwrap(),
            )
            .with_method(
                method("ListItems")
                    .with_server_streaming()
                    .with_get("/v1/items")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let table = RouteTable::assemble(&service, true);
        assert!(table.entries.is_empty());
        assert!(logs_contain("ignoring 1 http binding(s) on streaming method"));
    }
}
