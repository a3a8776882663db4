use std::{fmt, marker::PhantomData};

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::{
    Message, Status,
    shape::{BidiStreaming, ClientSends, ClientStreaming, ServerSends, ServerStreaming},
};

/// Frame level stream provided by the transport for streaming methods.
pub trait RawServerStream: Send + 'static {
    /// Send one encoded message to the client.
    fn send_frame(&mut self, frame: Bytes) -> BoxFuture<'_, Result<(), Status>>;

    /// Receive the next encoded message from the client,
    /// `None` once the client closed its sending side.
    fn recv_frame(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, Status>>;
}

/// Untyped message stream handed to generated stream handlers.
pub struct ServerStream {
    inner: Box<dyn RawServerStream>,
}

impl ServerStream {
    /// Wrap a transport stream.
    pub fn new(raw: impl RawServerStream) -> Self {
        Self {
            inner: Box::new(raw),
        }
    }

    /// Encode and send `msg`.
    pub async fn send_msg<M: Message>(&mut self, msg: &M) -> Result<(), Status> {
        self.inner.send_frame(Bytes::from(msg.encode_to_vec())).await
    }

    /// Receive and decode the next message.
    pub async fn recv_msg<M: Message>(&mut self) -> Result<Option<M>, Status> {
        match self.inner.recv_frame().await? {
            Some(frame) => Ok(Some(M::decode(frame)?)),
            None => Ok(None),
        }
    }

    /// Receive the single request of a server-streaming call.
    pub async fn recv_first<M: Message>(&mut self) -> Result<M, Status> {
        self.recv_msg()
            .await?
            .ok_or_else(|| Status::invalid_argument("stream closed before the request message"))
    }
}

impl fmt::Debug for ServerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerStream").finish_non_exhaustive()
    }
}

/// Typed handle around a [`ServerStream`], handed to service
/// implementations of streaming methods.
///
/// The `Shape` marker limits the handle to the operations of its method:
/// `send` when the server streams, `recv` when the client streams and
/// `send_and_close` when the server answers with a single response.
///
/// ```rust
/// use rama_rest::{Status, server::ClientStreamingServer};
///
/// async fn count(mut stream: ClientStreamingServer<(), u64>) -> Result<(), Status> {
///     let mut n = 0;
///     while stream.recv().await?.is_some() {
///         n += 1;
///     }
///     stream.send_and_close(&n).await
/// }
/// ```
///
/// The single response of a client-streaming call ends the stream:
///
/// ```compile_fail
/// use rama_rest::{Status, server::ClientStreamingServer};
///
/// async fn reply(stream: ClientStreamingServer<(), ()>) -> Result<(), Status> {
///     stream.send_and_close(&()).await?;
///     stream.send_and_close(&()).await
/// }
/// ```
///
/// ```compile_fail
/// use rama_rest::{Status, server::ClientStreamingServer};
///
/// async fn reply(mut stream: ClientStreamingServer<(), ()>) -> Result<(), Status> {
///     stream.send(&()).await
/// }
/// ```
///
/// The request of a server-streaming call is received by the generated
/// handler, the handle cannot receive:
///
/// ```compile_fail
/// use rama_rest::{Status, server::ServerStreamingServer};
///
/// async fn read(mut stream: ServerStreamingServer<()>) -> Result<Option<()>, Status> {
///     stream.recv().await
/// }
/// ```
pub struct GenericServerStream<Req, Res, Shape> {
    stream: ServerStream,
    _marker: PhantomData<fn(Req, Shape) -> Res>,
}

/// Server side of a method where the server sends a stream of responses.
pub type ServerStreamingServer<Res> = GenericServerStream<(), Res, ServerStreaming>;

/// Server side of a method where the client sends a stream of requests.
pub type ClientStreamingServer<Req, Res> = GenericServerStream<Req, Res, ClientStreaming>;

/// Server side of a method where both ends send a stream of messages.
pub type BidiStreamingServer<Req, Res> = GenericServerStream<Req, Res, BidiStreaming>;

impl<Req, Res, Shape> GenericServerStream<Req, Res, Shape> {
    /// Wrap an untyped stream.
    #[must_use]
    pub fn new(stream: ServerStream) -> Self {
        Self {
            stream,
            _marker: PhantomData,
        }
    }

    /// Consume the handle, returning the untyped stream.
    pub fn into_inner(self) -> ServerStream {
        self.stream
    }
}

impl<Req, Res: Message, Shape: ServerSends> GenericServerStream<Req, Res, Shape> {
    /// Send a response message.
    pub async fn send(&mut self, msg: &Res) -> Result<(), Status> {
        self.stream.send_msg(msg).await
    }
}

impl<Req: Message, Res, Shape: ClientSends> GenericServerStream<Req, Res, Shape> {
    /// Receive the next request, `None` once the client is done.
    pub async fn recv(&mut self) -> Result<Option<Req>, Status> {
        self.stream.recv_msg().await
    }
}

impl<Req, Res: Message> ClientStreamingServer<Req, Res> {
    /// Send the single response of a client-streaming call.
    ///
    /// The handle is consumed, dropping the transport stream
    /// once the response is sent.
    pub async fn send_and_close(mut self, msg: &Res) -> Result<(), Status> {
        self.stream.send_msg(msg).await
    }
}

impl<Req, Res, Shape> fmt::Debug for GenericServerStream<Req, Res, Shape> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericServerStream")
            .field("request", &std::any::type_name::<Req>())
            .field("response", &std::any::type_name::<Res>())
            .field("shape", &std::any::type_name::<Shape>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::Code;

    #[derive(Default, Clone)]
    struct Pipe {
        incoming: Arc<Mutex<VecDeque<Bytes>>>,
        outgoing: Arc<Mutex<Vec<Bytes>>>,
    }

    impl RawServerStream for Pipe {
        fn send_frame(&mut self, frame: Bytes) -> BoxFuture<'_, Result<(), Status>> {
            self.outgoing.lock().unwrap().push(frame);
            Box::pin(async { Ok(()) })
        }

        fn recv_frame(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, Status>> {
            let frame = self.incoming.lock().unwrap().pop_front();
            Box::pin(async move { Ok(frame) })
        }
    }

    #[tokio::test]
    async fn recv_first_requires_a_message() {
        let mut stream = ServerStream::new(Pipe::default());
        let err = stream.recv_first::<()>().await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn typed_send_and_recv() {
        let pipe = Pipe::default();
        pipe.incoming.lock().unwrap().push_back(Bytes::new());

        let mut stream = BidiStreamingServer::<(), ()>::new(ServerStream::new(pipe.clone()));
        assert!(stream.recv().await.unwrap().is_some());
        assert!(stream.recv().await.unwrap().is_none());
        stream.send(&()).await.unwrap();
        stream.send(&()).await.unwrap();

        assert_eq!(pipe.outgoing.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn send_and_close_releases_the_transport() {
        let pipe = Pipe::default();
        pipe.incoming.lock().unwrap().push_back(Bytes::new());

        let mut stream = ClientStreamingServer::<(), ()>::new(ServerStream::new(pipe.clone()));
        assert!(stream.recv().await.unwrap().is_some());
        assert_eq!(Arc::strong_count(&pipe.outgoing), 2);

        stream.send_and_close(&()).await.unwrap();
        assert_eq!(pipe.outgoing.lock().unwrap().len(), 1);
        assert_eq!(Arc::strong_count(&pipe.outgoing), 1);
    }
}
