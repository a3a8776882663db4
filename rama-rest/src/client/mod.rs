//! Client side of the REST rpc contract.
//!
//! Generated clients are generic over a [`ClientConn`], the transport handle
//! which performs unary calls and opens streams. Streaming methods return a
//! [`GenericClientStream`] (or, for bindings generated in legacy mode, a
//! dedicated wrapper type) around the transport's [`ClientStream`].

use std::time::Duration;

use http::{HeaderName, HeaderValue};

use crate::{Context, Message, Status};

mod stream;

#[doc(inline)]
pub use stream::{
    BidiStreamingClient, ClientStreamingClient, GenericClientStream, ServerStreamingClient,
};

/// Options passed along with a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CallOption {
    /// Marks that the method name passed to the transport is a constant
    /// known at compile time. Prepended by generated clients to every call.
    StaticMethod,
    /// Extra request header.
    Header(HeaderName, HeaderValue),
    /// Maximum duration of the call.
    Timeout(Duration),
}

/// The [`CallOption::StaticMethod`] option.
#[must_use]
pub fn static_method() -> CallOption {
    CallOption::StaticMethod
}

impl CallOption {
    /// Returns `true` for [`CallOption::StaticMethod`].
    #[must_use]
    pub fn is_static_method(&self) -> bool {
        matches!(self, Self::StaticMethod)
    }
}

/// Describes a streaming method, as used to open a stream.
///
/// Generated clients keep one per streaming method in a
/// `{Service}_StreamDesc` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDesc {
    /// Name of the method, as declared in the service.
    pub stream_name: &'static str,
    /// The client sends a stream of messages.
    pub client_streams: bool,
    /// The server sends a stream of messages.
    pub server_streams: bool,
}

/// The transport used by generated clients.
pub trait ClientConn: Send + Sync {
    /// Stream opened for streaming methods.
    type Stream: ClientStream + 'static;

    /// Perform a unary call of `method`, decoding the reply into `res`.
    fn invoke<Req, Res>(
        &self,
        ctx: &Context,
        method: &'static str,
        req: &Req,
        res: &mut Res,
        opts: Vec<CallOption>,
    ) -> impl Future<Output = Result<(), Status>> + Send
    where
        Req: Message,
        Res: Message;

    /// Open a stream for the streaming `method` described by `desc`.
    fn new_stream(
        &self,
        ctx: &Context,
        desc: &'static StreamDesc,
        method: &'static str,
        opts: Vec<CallOption>,
    ) -> impl Future<Output = Result<Self::Stream, Status>> + Send;
}

/// A message stream opened by a [`ClientConn`].
pub trait ClientStream: Send {
    /// Send a single message to the server.
    fn send_msg<M: Message>(&mut self, msg: &M) -> impl Future<Output = Result<(), Status>> + Send;

    /// Receive the next message from the server, `None` once the
    /// server has finished sending.
    fn recv_msg<M: Message>(&mut self)
    -> impl Future<Output = Result<Option<M>, Status>> + Send;

    /// Close the sending side of the stream.
    fn close_send(&mut self) -> impl Future<Output = Result<(), Status>> + Send;
}
