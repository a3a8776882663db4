//! Server side generation: the `{Service}Server` trait, one handler per
//! method and the `{Service}RestServiceDesc` route table.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tracing::trace;

use crate::{
    Method, Result, RouteTable, Service, StreamInterfaceMode, StreamShape, generate_doc_comments,
    naming, route::describe,
};

pub(crate) struct ServerContext<'a> {
    pub(crate) emit_package: bool,
    pub(crate) proto_path: &'a str,
    pub(crate) compile_well_known_types: bool,
    pub(crate) disable_comments: &'a HashSet<String>,
    pub(crate) stream_mode: StreamInterfaceMode,
}

/// Generate the server module of `service`.
pub(crate) fn generate_internal<T: Service>(
    service: &T,
    cx: &ServerContext<'_>,
    root: &TokenStream,
) -> Result<TokenStream> {
    let service_name = service.name();
    let full_service_name =
        naming::full_service_name(service.package(), service.identifier(), cx.emit_package);

    let module = format_ident!("{}", naming::server_module(service_name));
    let server_trait = format_ident!("{}", naming::server_trait(service_name));
    let desc_fn = format_ident!("{}", naming::service_desc_fn(service_name));

    let service_doc = if cx.disable_comments.contains(&full_service_name) {
        TokenStream::new()
    } else {
        generate_doc_comments(service.comment())
    };
    let trait_doc = format!(
        " Generated trait containing REST methods that should be implemented for use with {desc_fn}."
    );

    let mut consts = TokenStream::new();
    let mut aliases = TokenStream::new();
    let mut trait_methods = TokenStream::new();
    let mut handlers = TokenStream::new();
    let mut streams = Vec::new();

    for method in service.methods() {
        trace!("{full_service_name}: server method {}", method.identifier());

        let method_id = method.identifier();
        let shape = StreamShape::of(method);
        let (request, response) =
            method.request_response_name(cx.proto_path, cx.compile_well_known_types)?;

        let const_ident = format_ident!("{}", naming::full_method_const(service_name, method_id));
        let full_method = naming::full_method(
            service.package(),
            service.identifier(),
            method_id,
            cx.emit_package,
        );
        consts.extend(quote! {
            pub const #const_ident: &str = #full_method;
        });

        let stream_ty = match shape.generic_server_type() {
            None => None,
            Some(name) => {
                let generic = format_ident!("{name}");
                let generic = if shape.client_streams() {
                    quote!(#generic<#request, #response>)
                } else {
                    quote!(#generic<#response>)
                };
                Some(match cx.stream_mode {
                    StreamInterfaceMode::Generic => generic,
                    StreamInterfaceMode::Legacy => {
                        let alias =
                            format_ident!("{}", naming::server_stream_name(service_name, method_id));
                        aliases.extend(quote! {
                            pub type #alias = #generic;
                        });
                        quote!(#alias)
                    }
                })
            }
        };

        let doc = if cx.disable_comments.contains(&format!("{full_service_name}.{method_id}")) {
            TokenStream::new()
        } else {
            generate_doc_comments(method.comment())
        };
        let fn_ident = format_ident!("{}", method.name());
        let handler = format_ident!("{}", naming::handler_fn(service_name, method_id));

        match stream_ty {
            None => {
                trait_methods.extend(quote! {
                    #doc
                    fn #fn_ident(
                        &self,
                        ctx: Context,
                        request: #request,
                    ) -> impl Future<Output = std::result::Result<#response, Status>> + Send;
                });
                handlers.extend(unary_handler(
                    &handler,
                    &server_trait,
                    &fn_ident,
                    &const_ident,
                    &request,
                ));
            }
            Some(stream_ty) => {
                let request_arg = (!shape.client_streams()).then(|| quote!(request: #request,));
                trait_methods.extend(quote! {
                    #doc
                    fn #fn_ident(
                        &self,
                        ctx: Context,
                        #request_arg
                        stream: #stream_ty,
                    ) -> impl Future<Output = std::result::Result<(), Status>> + Send;
                });
                handlers.extend(stream_handler(
                    &handler,
                    &server_trait,
                    &fn_ident,
                    shape,
                    &request,
                    &stream_ty,
                ));

                let client_streams = shape.client_streams();
                let server_streams = shape.server_streams();
                streams.push(quote! {
                    StreamHandlerDesc {
                        stream_name: #method_id,
                        handler: #handler::<T>,
                        client_streams: #client_streams,
                        server_streams: #server_streams,
                    }
                });
            }
        }
    }

    let table = RouteTable::assemble(service, cx.emit_package);
    let routes = table.entries.iter().map(|entry| {
        let method_name = &entry.method_name;
        let description = &entry.description;
        let verb = entry.verb.method_tokens(root);
        let path = &entry.path;
        let deprecated = entry.deprecated;
        let handler = format_ident!("{}", entry.handler);
        quote! {
            MethodDesc {
                method_name: #method_name,
                desc: #description,
                method: #verb,
                path: #path,
                deprecated: #deprecated,
                handler: #handler::<T>,
            }
        }
    });
    let service_name_lit = &table.service_name;
    let handler_type = &table.handler_type;
    let service_desc_doc = format!(
        " Route table of `{full_service_name}`{}",
        match describe(service.comment()).as_str() {
            "" => ".".to_owned(),
            description => format!(": {description}"),
        }
    );

    Ok(quote! {
        /// Generated server implementations.
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

            #aliases

            #[doc = #trait_doc]
            #service_doc
            pub trait #server_trait: Send + Sync + 'static {
                #trait_methods
            }

            #handlers

            #[doc = #service_desc_doc]
            pub fn #desc_fn<T: #server_trait>() -> ServiceDesc<T> {
                ServiceDesc {
                    service_name: #service_name_lit,
                    handler_type: #handler_type,
                    methods: vec![#(#routes),*],
                    streams: vec![#(#streams),*],
                }
            }
        }
    })
}

fn unary_handler(
    handler: &syn::Ident,
    server_trait: &syn::Ident,
    fn_ident: &syn::Ident,
    const_ident: &syn::Ident,
    request: &TokenStream,
) -> TokenStream {
    quote! {
        pub fn #handler<T: #server_trait>(
            ctx: Context,
            srv: Arc<T>,
            interceptor: Option<UnaryServerInterceptor>,
        ) -> BoxFuture<'static, std::result::Result<BoxMessage, Status>> {
            Box::pin(async move {
                let request: #request = ctx.bind()?;
                let Some(interceptor) = interceptor else {
                    return srv.#fn_ident(ctx, request).await.map(BoxMessage::new);
                };
                let info = UnaryServerInfo {
                    server: srv.clone(),
                    full_method: #const_ident,
                    protocol: PROTOCOL,
                };
                let handler: UnaryHandler = Box::new(
                    move |ctx: Context,
                          request: BoxMessage|
                          -> BoxFuture<'static, std::result::Result<BoxMessage, Status>> {
                        Box::pin(async move {
                            let request = request.downcast::<#request>().map_err(|request| {
                                Status::internal(format!(
                                    "{}: unexpected request type {}",
                                    #const_ident,
                                    request.type_name(),
                                ))
                            })?;
                            srv.#fn_ident(ctx, request).await.map(BoxMessage::new)
                        })
                    },
                );
                interceptor(ctx, BoxMessage::new(request), info, handler).await
            })
        }
    }
}

fn stream_handler(
    handler: &syn::Ident,
    server_trait: &syn::Ident,
    fn_ident: &syn::Ident,
    shape: StreamShape,
    request: &TokenStream,
    stream_ty: &TokenStream,
) -> TokenStream {
    let body = if shape.client_streams() {
        quote! {
            srv.#fn_ident(ctx, <#stream_ty>::new(stream)).await
        }
    } else {
        quote! {
            let request: #request = stream.recv_first().await?;
            srv.#fn_ident(ctx, request, <#stream_ty>::new(stream)).await
        }
    };
    let stream_arg = if shape.client_streams() {
        quote!(stream: ServerStream)
    } else {
        quote!(mut stream: ServerStream)
    };

    quote! {
        pub fn #handler<T: #server_trait>(
            ctx: Context,
            srv: Arc<T>,
            #stream_arg,
        ) -> BoxFuture<'static, std::result::Result<(), Status>> {
            Box::pin(async move {
                #body
            })
        }
    }
}
