use std::{fmt, sync::Arc};

use futures::future::BoxFuture;
use http::Method;
use tracing::{debug, trace};

use crate::{BoxMessage, Context, Status};

use super::{ServerStream, UnaryServerInterceptor};

/// Generated handler of a unary method.
pub type UnaryMethodHandler<T> = fn(
    Context,
    Arc<T>,
    Option<UnaryServerInterceptor>,
) -> BoxFuture<'static, Result<BoxMessage, Status>>;

/// Generated handler of a streaming method.
pub type StreamMethodHandler<T> =
    fn(Context, Arc<T>, ServerStream) -> BoxFuture<'static, Result<(), Status>>;

/// Route table of a service, as returned by the generated
/// `{Service}RestServiceDesc` function.
pub struct ServiceDesc<T> {
    /// Full name of the service, `{package}.{Service}`.
    pub service_name: &'static str,
    /// Name of the server trait the service implements.
    pub handler_type: &'static str,
    /// One entry per HTTP binding of every unary method, in declaration order.
    pub methods: Vec<MethodDesc<T>>,
    /// One entry per streaming method, in declaration order.
    pub streams: Vec<StreamHandlerDesc<T>>,
}

/// A single route: an HTTP verb and path template bound to a unary handler.
pub struct MethodDesc<T> {
    /// Name of the method, as declared in the service.
    pub method_name: &'static str,
    /// Description derived from the method documentation.
    pub desc: &'static str,
    /// HTTP verb of the route.
    pub method: Method,
    /// Path template, e.g. `/v1/items/{id}`.
    pub path: &'static str,
    /// The method is marked deprecated.
    pub deprecated: bool,
    /// Handler shared by every route of the method.
    pub handler: UnaryMethodHandler<T>,
}

/// A streaming method, dispatched by name rather than by route.
pub struct StreamHandlerDesc<T> {
    /// Name of the method, as declared in the service.
    pub stream_name: &'static str,
    /// The stream handler.
    pub handler: StreamMethodHandler<T>,
    /// The client sends a stream of messages.
    pub client_streams: bool,
    /// The server sends a stream of messages.
    pub server_streams: bool,
}

impl<T> MethodDesc<T> {
    /// Match `path` against the path template of this route,
    /// returning the captured path parameters on success.
    ///
    /// A `{name}` segment captures exactly one non-empty path segment,
    /// `*` matches one segment without capturing it. The query string
    /// is ignored.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Vec<(&'static str, String)>> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        let mut template = self.path.trim_matches('/').split('/');
        let mut segments = path.trim_matches('/').split('/');
        let mut params = Vec::new();

        loop {
            match (template.next(), segments.next()) {
                (None, None) => return Some(params),
                (Some(expected), Some(segment)) => {
                    if let Some(name) = expected
                        .strip_prefix('{')
                        .and_then(|var| var.strip_suffix('}'))
                    {
                        if segment.is_empty() {
                            return None;
                        }
                        let name = name.split_once('=').map_or(name, |(name, _)| name);
                        params.push((name, segment.to_owned()));
                    } else if expected != "*" && expected != segment {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
}

impl<T> ServiceDesc<T> {
    /// Find the first route matching `method` and `path`,
    /// together with the captured path parameters.
    #[must_use]
    pub fn route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&MethodDesc<T>, Vec<(&'static str, String)>)> {
        self.methods
            .iter()
            .filter(|desc| desc.method == method)
            .find_map(|desc| desc.match_path(path).map(|params| (desc, params)))
    }

    /// Find a streaming method by name.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHandlerDesc<T>> {
        self.streams.iter().find(|desc| desc.stream_name == name)
    }

    /// Dispatch a unary request to the route matching `method` and `path`.
    ///
    /// Captured path parameters are added to `ctx` before the handler runs.
    /// A request matching no route fails with [`Code::NotFound`].
    ///
    /// [`Code::NotFound`]: crate::Code::NotFound
    pub async fn serve_unary(
        &self,
        mut ctx: Context,
        srv: Arc<T>,
        interceptor: Option<UnaryServerInterceptor>,
        method: &Method,
        path: &str,
    ) -> Result<BoxMessage, Status> {
        let Some((desc, params)) = self.route(method, path) else {
            debug!("{}: no route for {method} {path}", self.service_name);
            return Err(Status::not_found(format!("no route for {method} {path}")));
        };
        trace!(
            "{}: {method} {path} routed to {}",
            self.service_name, desc.method_name
        );
        if desc.deprecated {
            debug!(
                "{}: deprecated method {} called",
                self.service_name, desc.method_name
            );
        }
        for (name, value) in params {
            ctx.set_path_param(name, value);
        }
        (desc.handler)(ctx, srv, interceptor).await
    }

    /// Dispatch a streaming call to the streaming method `name`.
    ///
    /// An unknown method fails with [`Code::NotFound`].
    ///
    /// [`Code::NotFound`]: crate::Code::NotFound
    pub async fn serve_stream(
        &self,
        ctx: Context,
        srv: Arc<T>,
        name: &str,
        stream: ServerStream,
    ) -> Result<(), Status> {
        let Some(desc) = self.stream(name) else {
            debug!("{}: no stream named {name}", self.service_name);
            return Err(Status::not_found(format!("no stream named {name}")));
        };
        (desc.handler)(ctx, srv, stream).await
    }
}

impl<T> fmt::Debug for ServiceDesc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDesc")
            .field("service_name", &self.service_name)
            .field("handler_type", &self.handler_type)
            .field("methods", &self.methods)
            .field("streams", &self.streams)
            .finish()
    }
}

impl<T> fmt::Debug for MethodDesc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("method_name", &self.method_name)
            .field("desc", &self.desc)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("deprecated", &self.deprecated)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for StreamHandlerDesc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandlerDesc")
            .field("stream_name", &self.stream_name)
            .field("client_streams", &self.client_streams)
            .field("server_streams", &self.server_streams)
            .finish_non_exhaustive()
    }
}
