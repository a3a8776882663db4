use std::{fmt, marker::PhantomData};

use crate::{
    Message, Status,
    shape::{BidiStreaming, ClientSends, ClientStreaming, ServerSends, ServerStreaming},
};

use super::ClientStream;

/// Typed handle around a [`ClientStream`], returned by generated clients
/// for streaming methods.
///
/// The `Shape` marker limits the handle to the operations of its method:
/// `send` when the client streams, `recv` when the server streams and
/// `close_and_recv` when the server answers with a single response.
/// Use the alias matching the shape of the method:
/// [`ClientStreamingClient`], [`ServerStreamingClient`] or
/// [`BidiStreamingClient`].
///
/// ```rust
/// use rama_rest::{Status, client::{ClientStream, ServerStreamingClient}};
///
/// async fn drain<S: ClientStream>(mut stream: ServerStreamingClient<S, ()>) -> Result<usize, Status> {
///     let mut n = 0;
///     while stream.recv().await?.is_some() {
///         n += 1;
///     }
///     Ok(n)
/// }
/// ```
///
/// The request of a server-streaming call is sent by the generated client,
/// the handle cannot send:
///
/// ```compile_fail
/// use rama_rest::{Status, client::{ClientStream, ServerStreamingClient}};
///
/// async fn send<S: ClientStream>(mut stream: ServerStreamingClient<S, ()>) -> Result<(), Status> {
///     stream.send(&()).await
/// }
/// ```
///
/// ```compile_fail
/// use rama_rest::{Status, client::{ClientStream, ServerStreamingClient}};
///
/// async fn close<S: ClientStream>(mut stream: ServerStreamingClient<S, ()>) -> Result<(), Status> {
///     stream.close_and_recv().await
/// }
/// ```
///
/// A client-streaming call has a single response, there is no `recv`:
///
/// ```compile_fail
/// use rama_rest::{Status, client::{ClientStream, ClientStreamingClient}};
///
/// async fn recv<S: ClientStream>(mut stream: ClientStreamingClient<S, (), ()>) -> Result<Option<()>, Status> {
///     stream.recv().await
/// }
/// ```
pub struct GenericClientStream<S, Req, Res, Shape> {
    /// The transport stream.
    pub client_stream: S,
    _marker: PhantomData<fn(Req, Shape) -> Res>,
}

/// Client side of a method where the client sends a stream of requests
/// and receives a single response.
pub type ClientStreamingClient<S, Req, Res> = GenericClientStream<S, Req, Res, ClientStreaming>;

/// Client side of a method where the client sends a single request
/// and receives a stream of responses. The request is sent by the
/// generated client before the handle is returned.
pub type ServerStreamingClient<S, Res> = GenericClientStream<S, (), Res, ServerStreaming>;

/// Client side of a method where both ends send a stream of messages.
pub type BidiStreamingClient<S, Req, Res> = GenericClientStream<S, Req, Res, BidiStreaming>;

impl<S, Req, Res, Shape> GenericClientStream<S, Req, Res, Shape> {
    /// Wrap a transport stream.
    pub const fn new(client_stream: S) -> Self {
        Self {
            client_stream,
            _marker: PhantomData,
        }
    }

    /// Consume the handle, returning the transport stream.
    pub fn into_inner(self) -> S {
        self.client_stream
    }
}

impl<S, Req, Res, Shape> GenericClientStream<S, Req, Res, Shape>
where
    S: ClientStream,
    Req: Message,
    Shape: ClientSends,
{
    /// Send a request message.
    pub async fn send(&mut self, msg: &Req) -> Result<(), Status> {
        self.client_stream.send_msg(msg).await
    }

    /// Close the sending side of the stream.
    pub async fn close_send(&mut self) -> Result<(), Status> {
        self.client_stream.close_send().await
    }
}

impl<S, Req, Res, Shape> GenericClientStream<S, Req, Res, Shape>
where
    S: ClientStream,
    Res: Message,
    Shape: ServerSends,
{
    /// Receive the next response, `None` once the server is done.
    pub async fn recv(&mut self) -> Result<Option<Res>, Status> {
        self.client_stream.recv_msg().await
    }
}

impl<S, Req, Res> ClientStreamingClient<S, Req, Res>
where
    S: ClientStream,
    Res: Message,
{
    /// Close the sending side and wait for the single response.
    pub async fn close_and_recv(&mut self) -> Result<Res, Status> {
        self.client_stream.close_send().await?;
        self.client_stream
            .recv_msg()
            .await?
            .ok_or_else(|| Status::unknown("stream closed without a response"))
    }
}

impl<S: fmt::Debug, Req, Res, Shape> fmt::Debug for GenericClientStream<S, Req, Res, Shape> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericClientStream")
            .field("client_stream", &self.client_stream)
            .field("request", &std::any::type_name::<Req>())
            .field("response", &std::any::type_name::<Res>())
            .field("shape", &std::any::type_name::<Shape>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::Code;

    #[derive(Debug, Default)]
    struct Recorder {
        sent: Vec<Vec<u8>>,
        replies: VecDeque<Vec<u8>>,
        closed: bool,
    }

    impl ClientStream for Recorder {
        async fn send_msg<M: Message>(&mut self, msg: &M) -> Result<(), Status> {
            self.sent.push(msg.encode_to_vec());
            Ok(())
        }

        async fn recv_msg<M: Message>(&mut self) -> Result<Option<M>, Status> {
            match self.replies.pop_front() {
                Some(buf) => Ok(Some(M::decode(buf.as_slice())?)),
                None => Ok(None),
            }
        }

        async fn close_send(&mut self) -> Result<(), Status> {
            self.closed = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_and_recv_closes_first() {
        let mut stream = ClientStreamingClient::<_, (), ()>::new(Recorder {
            replies: VecDeque::from([vec![]]),
            ..Default::default()
        });
        stream.send(&()).await.unwrap();
        stream.close_and_recv().await.unwrap();

        let inner = stream.into_inner();
        assert!(inner.closed);
        assert_eq!(inner.sent.len(), 1);
    }

    #[tokio::test]
    async fn close_and_recv_without_reply() {
        let mut stream = ClientStreamingClient::<_, (), ()>::new(Recorder::default());
        let err = stream.close_and_recv().await.unwrap_err();
        assert_eq!(err.code(), Code::Unknown);
    }

    #[tokio::test]
    async fn recv_until_done() {
        let mut stream = ServerStreamingClient::<_, ()>::new(Recorder {
            replies: VecDeque::from([vec![], vec![]]),
            ..Default::default()
        });
        assert!(stream.recv().await.unwrap().is_some());
        assert!(stream.recv().await.unwrap().is_some());
        assert!(stream.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bidi_sends_and_receives() {
        let mut stream = BidiStreamingClient::<_, (), ()>::new(Recorder {
            replies: VecDeque::from([vec![]]),
            ..Default::default()
        });
        stream.send(&()).await.unwrap();
        stream.send(&()).await.unwrap();
        stream.close_send().await.unwrap();
        assert!(stream.recv().await.unwrap().is_some());
        assert!(stream.recv().await.unwrap().is_none());

        let inner = stream.into_inner();
        assert!(inner.closed);
        assert_eq!(inner.sent.len(), 2);
    }
}
