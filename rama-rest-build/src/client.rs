//! Client side generation: the `{snake}_rest_client` module with the
//! client holder, full-method constants, the stream descriptor table and
//! the stream types of streaming methods.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tracing::trace;

use crate::{
    Method, Result, Service, StreamInterfaceMode, StreamShape, generate_deprecated,
    generate_doc_comments, naming, shape::stream_indices,
};

/// The client side of a service, ready to be emitted.
#[derive(Debug)]
pub(crate) struct ClientBinding {
    pub(crate) module: syn::Ident,
    pub(crate) holder: syn::Ident,
    /// Module level items: full-method constants and the stream descriptor table.
    pub(crate) consts: TokenStream,
    pub(crate) holder_def: TokenStream,
    /// One per method, in declaration order.
    pub(crate) calls: Vec<TokenStream>,
    /// Legacy stream traits and wrappers, or the generic mode aliases.
    pub(crate) stream_types: Vec<TokenStream>,
}

impl ClientBinding {
    pub(crate) fn into_tokens(self, root: &TokenStream) -> TokenStream {
        let Self {
            module,
            holder,
            consts,
            holder_def,
            calls,
            stream_types,
        } = self;

        quote! {
            /// Generated client implementations.
            pub mod #module {
                #![allow(
                    unused_variables,
                    dead_code,
                    missing_docs,
                    deprecated,
                    non_camel_case_types,
                    non_snake_case,
                    non_upper_case_globals,
                    clippy::wildcard_imports,
                    clippy::let_unit_value,
                )]
                use #root::codegen::*;

                #consts

                #(#stream_types)*

                #holder_def

                impl<T: ClientConn> #holder<T> {
                    #(#calls)*
                }
            }
        }
    }
}

pub(crate) struct ClientContext<'a> {
    pub(crate) emit_package: bool,
    pub(crate) proto_path: &'a str,
    pub(crate) compile_well_known_types: bool,
    pub(crate) disable_comments: &'a HashSet<String>,
    pub(crate) stream_mode: StreamInterfaceMode,
}

/// Generate the client module of `service`.
pub(crate) fn generate_internal<T: Service>(
    service: &T,
    cx: &ClientContext<'_>,
    root: &TokenStream,
) -> Result<TokenStream> {
    Ok(build_binding(service, cx)?.into_tokens(root))
}

pub(crate) fn build_binding<T: Service>(
    service: &T,
    cx: &ClientContext<'_>,
) -> Result<ClientBinding> {
    let service_name = service.name();
    let full_service_name =
        naming::full_service_name(service.package(), service.identifier(), cx.emit_package);

    let module = format_ident!("{}", naming::client_module(service_name));
    let holder = format_ident!("{}", naming::client_struct(service_name));
    let stream_table = format_ident!("{}", naming::stream_desc_table(service_name));

    let service_doc = if cx.disable_comments.contains(&full_service_name) {
        TokenStream::new()
    } else {
        generate_doc_comments(service.comment())
    };
    let service_deprecated = generate_deprecated(service.deprecated());

    let holder_def = quote! {
        #service_doc
        #service_deprecated
        #[derive(Debug, Clone)]
        pub struct #holder<T> {
            inner: T,
        }

        impl<T> #holder<T> {
            /// Create a new client on top of the `inner` transport.
            pub fn new(inner: T) -> Self {
                Self { inner }
            }

            /// Borrow the transport.
            pub fn get_ref(&self) -> &T {
                &self.inner
            }

            /// Consume the client, returning the transport.
            pub fn into_inner(self) -> T {
                self.inner
            }
        }
    };

    let mut full_method_consts = TokenStream::new();
    let mut stream_descs = Vec::new();
    let mut calls = Vec::with_capacity(service.methods().len());
    let mut stream_types = Vec::new();

    let indices = stream_indices(service.methods());
    for (method, index) in service.methods().iter().zip(indices) {
        trace!("{full_service_name}: client method {}", method.identifier());

        let method_id = method.identifier();
        let const_ident = format_ident!("{}", naming::full_method_const(service_name, method_id));
        let full_method = naming::full_method(
            service.package(),
            service.identifier(),
            method_id,
            cx.emit_package,
        );
        full_method_consts.extend(quote! {
            pub const #const_ident: &str = #full_method;
        });

        let shape = StreamShape::of(method);
        let (request, response) =
            method.request_response_name(cx.proto_path, cx.compile_well_known_types)?;

        let doc = if cx.disable_comments.contains(&format!("{full_service_name}.{method_id}")) {
            TokenStream::new()
        } else {
            generate_doc_comments(method.comment())
        };
        let deprecated = generate_deprecated(method.deprecated());
        let fn_ident = format_ident!("{}", method.name());

        let call = match (index, shape.generic_client_type()) {
            (Some(index), Some(generic_name)) => {
                let client_streams = shape.client_streams();
                let server_streams = shape.server_streams();
                stream_descs.push(quote! {
                    StreamDesc {
                        stream_name: #method_id,
                        client_streams: #client_streams,
                        server_streams: #server_streams,
                    }
                });

                let (handle, construct) = match cx.stream_mode {
                    StreamInterfaceMode::Generic => {
                        let ty = format_ident!("{generic_name}");
                        let alias = format_ident!(
                            "{}",
                            naming::client_stream_name(service_name, method_id)
                        );
                        let aliased = generic_type(&ty, shape, &quote!(S), &request, &response);
                        stream_types.push(quote! {
                            /// This type alias is provided for backwards compatibility with
                            /// bindings generated in legacy stream mode.
                            pub type #alias<S> = #aliased;
                        });
                        (
                            generic_type(&ty, shape, &quote!(T::Stream), &request, &response),
                            quote!(#ty::new(stream)),
                        )
                    }
                    StreamInterfaceMode::Legacy => {
                        stream_types.push(legacy_stream_types(
                            service_name,
                            method_id,
                            shape,
                            &request,
                            &response,
                        ));
                        let wrapper = format_ident!(
                            "{}",
                            naming::legacy_client_stream_type(service_name, method_id)
                        );
                        (
                            quote!(#wrapper<T::Stream>),
                            quote!(#wrapper { client_stream: stream }),
                        )
                    }
                };

                generate_streaming(
                    &fn_ident,
                    &const_ident,
                    &stream_table,
                    index,
                    shape,
                    &request,
                    &handle,
                    &construct,
                )
            }
            _ => generate_unary(&fn_ident, &const_ident, &request, &response),
        };

        calls.push(quote! {
            #doc
            #deprecated
            #call
        });
    }

    let stream_count = stream_descs.len();
    let consts = quote! {
        #full_method_consts

        pub static #stream_table: [StreamDesc; #stream_count] = [
            #(#stream_descs),*
        ];
    };

    Ok(ClientBinding {
        module,
        holder,
        consts,
        holder_def,
        calls,
        stream_types,
    })
}

fn generate_unary(
    fn_ident: &syn::Ident,
    const_ident: &syn::Ident,
    request: &TokenStream,
    response: &TokenStream,
) -> TokenStream {
    quote! {
        pub async fn #fn_ident(
            &self,
            ctx: &Context,
            request: &#request,
            opts: Vec<CallOption>,
        ) -> std::result::Result<#response, Status> {
            let mut c_opts = Vec::with_capacity(opts.len() + 1);
            c_opts.push(static_method());
            c_opts.extend(opts);
            let mut out = <#response as Default>::default();
            self.inner
                .invoke(ctx, #const_ident, request, &mut out, c_opts)
                .await?;
            Ok(out)
        }
    }
}

#[expect(clippy::too_many_arguments)]
fn generate_streaming(
    fn_ident: &syn::Ident,
    const_ident: &syn::Ident,
    stream_table: &syn::Ident,
    index: usize,
    shape: StreamShape,
    request: &TokenStream,
    handle: &TokenStream,
    construct: &TokenStream,
) -> TokenStream {
    let open = quote! {
        let mut c_opts = Vec::with_capacity(opts.len() + 1);
        c_opts.push(static_method());
        c_opts.extend(opts);
        let stream = self
            .inner
            .new_stream(ctx, &#stream_table[#index], #const_ident, c_opts)
            .await?;
    };

    if shape.client_streams() {
        quote! {
            pub async fn #fn_ident(
                &self,
                ctx: &Context,
                opts: Vec<CallOption>,
            ) -> std::result::Result<#handle, Status> {
                #open
                Ok(#construct)
            }
        }
    } else {
        quote! {
            pub async fn #fn_ident(
                &self,
                ctx: &Context,
                request: &#request,
                opts: Vec<CallOption>,
            ) -> std::result::Result<#handle, Status> {
                #open
                let mut x = #construct;
                x.client_stream.send_msg(request).await?;
                x.client_stream.close_send().await?;
                Ok(x)
            }
        }
    }
}

/// The generic stream type `ty` of `shape`, instantiated over `stream`.
fn generic_type(
    ty: &syn::Ident,
    shape: StreamShape,
    stream: &TokenStream,
    request: &TokenStream,
    response: &TokenStream,
) -> TokenStream {
    if shape.client_streams() {
        quote!(#ty<#stream, #request, #response>)
    } else {
        quote!(#ty<#stream, #response>)
    }
}

fn legacy_stream_types(
    service: &str,
    method: &str,
    shape: StreamShape,
    request: &TokenStream,
    response: &TokenStream,
) -> TokenStream {
    let trait_ident = format_ident!("{}", naming::client_stream_name(service, method));
    let wrapper = format_ident!("{}", naming::legacy_client_stream_type(service, method));

    let mut trait_fns = TokenStream::new();
    let mut impl_fns = TokenStream::new();

    if shape.client_streams() {
        trait_fns.extend(quote! {
            fn send(
                &mut self,
                msg: &#request,
            ) -> impl Future<Output = std::result::Result<(), Status>> + Send;
        });
        impl_fns.extend(quote! {
            async fn send(&mut self, msg: &#request) -> std::result::Result<(), Status> {
                self.client_stream.send_msg(msg).await
            }
        });
    }

    if shape.server_streams() {
        trait_fns.extend(quote! {
            fn recv(
                &mut self,
            ) -> impl Future<Output = std::result::Result<Option<#response>, Status>> + Send;
        });
        impl_fns.extend(quote! {
            async fn recv(&mut self) -> std::result::Result<Option<#response>, Status> {
                self.client_stream.recv_msg().await
            }
        });
    } else {
        trait_fns.extend(quote! {
            fn close_and_recv(
                &mut self,
            ) -> impl Future<Output = std::result::Result<#response, Status>> + Send;
        });
        impl_fns.extend(quote! {
            async fn close_and_recv(&mut self) -> std::result::Result<#response, Status> {
                self.client_stream.close_send().await?;
                self.client_stream
                    .recv_msg()
                    .await?
                    .ok_or_else(|| Status::unknown("stream closed without a response"))
            }
        });
    }

    quote! {
        pub trait #trait_ident: ClientStream {
            #trait_fns
        }

        pub struct #wrapper<S> {
            pub client_stream: S,
        }

        impl<S: ClientStream> ClientStream for #wrapper<S> {
            fn send_msg<M: Message>(
                &mut self,
                msg: &M,
            ) -> impl Future<Output = std::result::Result<(), Status>> + Send {
                self.client_stream.send_msg(msg)
            }

            fn recv_msg<M: Message>(
                &mut self,
            ) -> impl Future<Output = std::result::Result<Option<M>, Status>> + Send {
                self.client_stream.recv_msg()
            }

            fn close_send(
                &mut self,
            ) -> impl Future<Output = std::result::Result<(), Status>> + Send {
                self.client_stream.close_send()
            }
        }

        impl<S: ClientStream> #trait_ident for #wrapper<S> {
            #impl_fns
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::{RamaRestMethod, Service as ManualService};

    // whitespace and trailing comma insensitive
    fn normalize(s: &str) -> String {
        s.split_whitespace()
            .collect::<String>()
            .replace(",}", "}")
            .replace(",)", ")")
            .replace(",]", "]")
    }

    #[track_caller]
    fn assert_has(code: &str, needle: &str) {
        assert!(
            normalize(code).contains(&normalize(needle)),
            "missing `{needle}` in:\n{code}"
        );
    }

    /// The part of `code` between `start` and the next `end`.
    fn section(code: &str, start: &str, end: &str) -> String {
        let code = normalize(code);
        let rest = code.split(&normalize(start)).nth(1).unwrap_or_default();
        rest.split(&normalize(end)).next().unwrap_or_default().to_owned()
    }

    fn greeter() -> ManualService {
        ManualService::builder()
            .with_name("Greeter")
            .with_package("helloworld")
            .with_comment(" The greeting service.")
            .with_method(
                RamaRestMethod::builder()
                    .with_name("say_hello")
                    .with_route_name("SayHello")
                    .with_input_type("crate::HelloRequest")
                    .with_output_type("crate::HelloReply")
                    .with_get("/v1/hello")
                    .build()
                    .unwrap(),
            )
            .with_method(
                RamaRestMethod::builder()
                    .with_name("list_items")
                    .with_route_name("ListItems")
                    .with_input_type("crate::ListRequest")
                    .with_output_type("crate::Item")
                    .with_server_streaming()
                    .build()
                    .unwrap(),
            )
            .with_method(
                RamaRestMethod::builder()
                    .with_name("upload")
                    .with_route_name("Upload")
                    .with_input_type("crate::Item")
                    .with_output_type("()")
                    .with_client_streaming()
                    .with_deprecated()
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn generate(service: &ManualService, stream_mode: StreamInterfaceMode) -> String {
        let disable_comments = HashSet::new();
        let cx = ClientContext {
            emit_package: true,
            proto_path: "super",
            compile_well_known_types: false,
            disable_comments: &disable_comments,
            stream_mode,
        };
        let tokens = generate_internal(service, &cx, &quote!(::rama_rest)).unwrap();
        prettyplease::unparse(&syn::parse2(tokens).unwrap())
    }

    #[test]
    fn holder_and_consts() {
        let code = generate(&greeter(), StreamInterfaceMode::Generic);
        assert_has(&code, "pub mod greeter_rest_client {");
        assert_has(&code, "use ::rama_rest::codegen::*;");
        assert!(code.contains("The greeting service."));
        assert_has(&code, "pub struct GreeterClient<T> { inner: T }");
        assert_has(
            &code,
            r#"pub const Greeter_SayHello_FullMethodName: &str = "/helloworld.Greeter/SayHello";"#,
        );
        assert_has(
            &code,
            r#"pub const Greeter_ListItems_FullMethodName: &str = "/helloworld.Greeter/ListItems";"#,
        );
        assert_has(&code, "pub static Greeter_StreamDesc: [StreamDesc; 2usize] = [");
        assert_has(
            &code,
            r#"StreamDesc { stream_name: "ListItems", client_streams: false, server_streams: true }"#,
        );
        assert_has(
            &code,
            r#"StreamDesc { stream_name: "Upload", client_streams: true, server_streams: false }"#,
        );
    }

    #[test]
    fn unary_prepends_static_method() {
        let code = generate(&greeter(), StreamInterfaceMode::Generic);
        assert_has(
            &code,
            "pub async fn say_hello(&self, ctx: &Context, request: &crate::HelloRequest, opts: Vec<CallOption>) -> std::result::Result<crate::HelloReply, Status> {",
        );
        assert_has(&code, "c_opts.push(static_method()); c_opts.extend(opts);");
        assert_has(&code, "let mut out = <crate::HelloReply as Default>::default();");
        assert_has(
            &code,
            ".invoke(ctx, Greeter_SayHello_FullMethodName, request, &mut out, c_opts)",
        );
    }

    #[test]
    fn generic_streams() {
        let code = generate(&greeter(), StreamInterfaceMode::Generic);
        assert_has(
            &code,
            "pub type Greeter_ListItemsClient<S> = ServerStreamingClient<S, crate::Item>;",
        );
        assert_has(
            &code,
            "pub type Greeter_UploadClient<S> = ClientStreamingClient<S, crate::Item, ()>;",
        );
        assert_has(
            &code,
            "-> std::result::Result<ServerStreamingClient<T::Stream, crate::Item>, Status> {",
        );
        assert_has(
            &code,
            ".new_stream(ctx, &Greeter_StreamDesc[0usize], Greeter_ListItems_FullMethodName, c_opts)",
        );
        assert_has(
            &code,
            "let mut x = ServerStreamingClient::new(stream); x.client_stream.send_msg(request).await?; x.client_stream.close_send().await?; Ok(x)",
        );
        assert_has(
            &code,
            ".new_stream(ctx, &Greeter_StreamDesc[1usize], Greeter_Upload_FullMethodName, c_opts)",
        );
        assert_has(&code, "Ok(ClientStreamingClient::new(stream))");
        assert!(!code.contains("pub trait"));
    }

    #[test]
    fn legacy_server_streaming_exposes_recv_only() {
        let code = generate(&greeter(), StreamInterfaceMode::Legacy);
        assert_has(&code, "pub trait Greeter_ListItemsClient: ClientStream {");
        assert_has(&code, "pub struct greeterListItemsClient<S> { pub client_stream: S }");
        assert_has(
            &code,
            "impl<S: ClientStream> Greeter_ListItemsClient for greeterListItemsClient<S> {",
        );
        assert_has(
            &code,
            "-> std::result::Result<greeterListItemsClient<T::Stream>, Status> {",
        );
        assert_has(
            &code,
            "let mut x = greeterListItemsClient { client_stream: stream };",
        );

        let list_items = section(&code, "pub trait Greeter_ListItemsClient", "pub struct");
        assert!(list_items.contains("fnrecv("));
        assert!(!list_items.contains("fnsend("));
        assert!(!list_items.contains("fnclose_and_recv("));
    }

    #[test]
    fn legacy_client_streaming_exposes_send_and_close_and_recv() {
        let code = generate(&greeter(), StreamInterfaceMode::Legacy);
        let upload = section(&code, "pub trait Greeter_UploadClient: ClientStream {", "pub struct");
        assert!(upload.contains("fnsend(&mutself,msg:&crate::Item)"));
        assert!(upload.contains("fnclose_and_recv("));
        assert!(!upload.contains("fnrecv("));
        assert!(!code.contains("pub type Greeter_UploadClient"));
    }

    #[test]
    fn deprecated_method() {
        let code = generate(&greeter(), StreamInterfaceMode::Generic);
        assert_has(&code, "#[deprecated] pub async fn upload(");
        assert!(!normalize(&code).contains(&normalize("#[deprecated] pub async fn say_hello(")));
    }

    #[test]
    fn bidi_returns_stream_handle() {
        let chat = ManualService::builder()
            .with_name("Chat")
            .with_package("chat")
            .with_method(
                RamaRestMethod::builder()
                    .with_name("stream")
                    .with_route_name("Stream")
                    .with_input_type("crate::Msg")
                    .with_output_type("crate::Msg")
                    .with_client_streaming()
                    .with_server_streaming()
                    .with_post("/v1/chat")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let code = generate(&chat, StreamInterfaceMode::Generic);
        assert_has(
            &code,
            "pub async fn stream(&self, ctx: &Context, opts: Vec<CallOption>) -> std::result::Result<BidiStreamingClient<T::Stream, crate::Msg, crate::Msg>, Status> {",
        );
        assert_has(&code, "Ok(BidiStreamingClient::new(stream))");
        assert_has(&code, "pub static Chat_StreamDesc: [StreamDesc; 1usize] = [");
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(&greeter(), StreamInterfaceMode::Legacy);
        let b = generate(&greeter(), StreamInterfaceMode::Legacy);
        assert_eq!(a, b);
    }
}
