//! Shape markers of the generic stream handles.
//!
//! [`GenericClientStream`](crate::client::GenericClientStream) and
//! [`GenericServerStream`](crate::server::GenericServerStream) carry one of
//! the markers below, which decides the operations the handle offers.

/// The client sends a stream of requests, the server a single response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStreaming;

/// The client sends a single request, the server a stream of responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStreaming;

/// Both ends send a stream of messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BidiStreaming;

/// Shapes in which the client sends a stream of requests.
pub trait ClientSends: private::Sealed {}

/// Shapes in which the server sends a stream of responses.
pub trait ServerSends: private::Sealed {}

impl ClientSends for ClientStreaming {}
impl ClientSends for BidiStreaming {}

impl ServerSends for ServerStreaming {}
impl ServerSends for BidiStreaming {}

mod private {
    pub trait Sealed {}

    impl Sealed for super::ClientStreaming {}
    impl Sealed for super::ServerStreaming {}
    impl Sealed for super::BidiStreaming {}
}
