//! Server side of the REST rpc contract.
//!
//! For every service the generator emits a `{Service}Server` trait, one
//! handler function per method and a `{Service}RestServiceDesc` function
//! returning the [`ServiceDesc`]: the route table a transport dispatches
//! incoming requests with.
//!
//! Unary handlers thread an optional [`UnaryServerInterceptor`]:
//! when present it receives the decoded request, a [`UnaryServerInfo`]
//! describing the call and the terminal [`UnaryHandler`] which invokes
//! the service implementation.

use std::{any::Any, fmt, sync::Arc};

use futures::future::BoxFuture;

use crate::{BoxMessage, Context, Status};

mod desc;
mod stream;

#[doc(inline)]
pub use desc::{MethodDesc, ServiceDesc, StreamHandlerDesc, StreamMethodHandler, UnaryMethodHandler};
#[doc(inline)]
pub use stream::{
    BidiStreamingServer, ClientStreamingServer, GenericServerStream, RawServerStream,
    ServerStream, ServerStreamingServer,
};

/// Information about a unary call, handed to a [`UnaryServerInterceptor`].
#[derive(Clone)]
pub struct UnaryServerInfo {
    /// The service implementation the call is dispatched to.
    pub server: Arc<dyn Any + Send + Sync>,
    /// Full name of the method, `/{package}.{Service}/{Method}`.
    pub full_method: &'static str,
    /// Protocol the call arrived over, always [`PROTOCOL`](crate::PROTOCOL).
    pub protocol: &'static str,
}

impl fmt::Debug for UnaryServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryServerInfo")
            .field("full_method", &self.full_method)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// The terminal handler of a unary call, invoking the service implementation.
///
/// The request passed to it must be of the method's request type,
/// any other message is rejected with an internal error.
pub type UnaryHandler =
    Box<dyn FnOnce(Context, BoxMessage) -> BoxFuture<'static, Result<BoxMessage, Status>> + Send>;

/// Intercepts the execution of unary calls.
///
/// An interceptor may inspect or replace the request, short-circuit the
/// call by not invoking the handler, or post-process its response.
pub type UnaryServerInterceptor = Arc<
    dyn Fn(
            Context,
            BoxMessage,
            UnaryServerInfo,
            UnaryHandler,
        ) -> BoxFuture<'static, Result<BoxMessage, Status>>
        + Send
        + Sync,
>;

/// Create a [`UnaryServerInterceptor`] from an async function.
///
/// ```rust
/// use rama_rest::server::{UnaryHandler, UnaryServerInfo, UnaryServerInterceptor, unary_interceptor};
///
/// let interceptor: UnaryServerInterceptor = unary_interceptor(
///     |ctx, req, info: UnaryServerInfo, handler: UnaryHandler| async move {
///         assert_eq!(info.protocol, rama_rest::PROTOCOL);
///         handler(ctx, req).await
///     },
/// );
/// ```
pub fn unary_interceptor<F, Fut>(f: F) -> UnaryServerInterceptor
where
    F: Fn(Context, BoxMessage, UnaryServerInfo, UnaryHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<BoxMessage, Status>> + Send + 'static,
{
    Arc::new(
        move |ctx: Context,
              req: BoxMessage,
              info: UnaryServerInfo,
              handler: UnaryHandler|
              -> BoxFuture<'static, Result<BoxMessage, Status>> {
            Box::pin(f(ctx, req, info, handler))
        },
    )
}
