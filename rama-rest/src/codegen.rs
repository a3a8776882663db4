//! Codegen exports used by `rama-rest-build`.

pub use std::any::Any;
pub use std::sync::Arc;

pub use futures::future::BoxFuture;
pub use http::Method;

pub use crate::client::{
    BidiStreamingClient, CallOption, ClientConn, ClientStream, ClientStreamingClient,
    ServerStreamingClient, StreamDesc, static_method,
};
pub use crate::server::{
    BidiStreamingServer, ClientStreamingServer, MethodDesc, ServerStream, ServerStreamingServer,
    ServiceDesc, StreamHandlerDesc, UnaryHandler, UnaryServerInfo, UnaryServerInterceptor,
};
pub use crate::{BoxMessage, Context, Message, PROTOCOL, Status};
