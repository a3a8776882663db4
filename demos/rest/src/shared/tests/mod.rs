use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::future::BoxFuture;
use rama_rest::{
    Context, Message, Status,
    client::{CallOption, ClientConn, ClientStream, StreamDesc},
    server::{RawServerStream, ServerStream, ServiceDesc, UnaryServerInterceptor},
};
use tokio::{sync::mpsc, task::JoinHandle};

mod generated_source;
mod routes;

/// In-process transport: unary calls run the first route of the called
/// method, streams run the stream handler on a spawned task.
pub(crate) struct Loopback<T> {
    desc: ServiceDesc<T>,
    srv: Arc<T>,
    interceptor: Option<UnaryServerInterceptor>,
    calls: Mutex<Vec<(&'static str, Vec<CallOption>)>>,
}

impl<T> Loopback<T> {
    pub(crate) fn new(desc: ServiceDesc<T>, srv: T) -> Self {
        Self {
            desc,
            srv: Arc::new(srv),
            interceptor: None,
            calls: Mutex::default(),
        }
    }

    pub(crate) fn with_interceptor(mut self, interceptor: UnaryServerInterceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub(crate) fn desc(&self) -> &ServiceDesc<T> {
        &self.desc
    }

    pub(crate) fn srv(&self) -> Arc<T> {
        self.srv.clone()
    }

    /// Method names and options of every call so far.
    pub(crate) fn calls(&self) -> Vec<(&'static str, Vec<CallOption>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl<T: Send + Sync + 'static> ClientConn for Loopback<T> {
    type Stream = LoopbackStream;

    async fn invoke<Req, Res>(
        &self,
        ctx: &Context,
        method: &'static str,
        req: &Req,
        res: &mut Res,
        opts: Vec<CallOption>,
    ) -> Result<(), Status>
    where
        Req: Message,
        Res: Message,
    {
        self.calls.lock().unwrap().push((method, opts));
        let name = method.rsplit('/').next().unwrap_or_default();
        let Some(handler) = self
            .desc
            .methods
            .iter()
            .find(|desc| desc.method_name == name)
            .map(|desc| desc.handler)
        else {
            return Err(Status::unimplemented(format!("no route for {method}")));
        };

        let ctx = ctx.clone().with_body(req.encode_to_vec());
        let reply = handler(ctx, self.srv.clone(), self.interceptor.clone()).await?;
        *res = Res::decode(reply.encode_to_bytes())?;
        Ok(())
    }

    async fn new_stream(
        &self,
        ctx: &Context,
        desc: &'static StreamDesc,
        method: &'static str,
        opts: Vec<CallOption>,
    ) -> Result<Self::Stream, Status> {
        self.calls.lock().unwrap().push((method, opts));
        let Some(stream_desc) = self.desc.stream(desc.stream_name) else {
            return Err(Status::unimplemented(format!("no stream for {method}")));
        };
        assert_eq!(stream_desc.client_streams, desc.client_streams);
        assert_eq!(stream_desc.server_streams, desc.server_streams);

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let stream = ServerStream::new(ServerPipe {
            tx: server_tx,
            rx: server_rx,
        });
        let result = tokio::spawn((stream_desc.handler)(ctx.clone(), self.srv.clone(), stream));

        Ok(LoopbackStream {
            tx: Some(client_tx),
            rx: client_rx,
            result: Some(result),
        })
    }
}

/// Client end of a loopback stream.
///
/// Once the server is done the result of its handler is reported
/// by the next receive.
pub(crate) struct LoopbackStream {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
    rx: mpsc::UnboundedReceiver<Bytes>,
    result: Option<JoinHandle<Result<(), Status>>>,
}

impl ClientStream for LoopbackStream {
    async fn send_msg<M: Message>(&mut self, msg: &M) -> Result<(), Status> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Status::failed_precondition("send after close"))?;
        tx.send(Bytes::from(msg.encode_to_vec()))
            .map_err(|err| Status::unavailable(err.to_string()))
    }

    async fn recv_msg<M: Message>(&mut self) -> Result<Option<M>, Status> {
        if let Some(frame) = self.rx.recv().await {
            return Ok(Some(M::decode(frame)?));
        }
        if let Some(result) = self.result.take() {
            result
                .await
                .map_err(|err| Status::internal(err.to_string()))??;
        }
        Ok(None)
    }

    async fn close_send(&mut self) -> Result<(), Status> {
        self.tx = None;
        Ok(())
    }
}

struct ServerPipe {
    tx: mpsc::UnboundedSender<Bytes>,
    rx: mpsc::UnboundedReceiver<Bytes>,
}

impl RawServerStream for ServerPipe {
    fn send_frame(&mut self, frame: Bytes) -> BoxFuture<'_, Result<(), Status>> {
        let result = self
            .tx
            .send(frame)
            .map_err(|err| Status::unavailable(err.to_string()));
        Box::pin(async move { result })
    }

    fn recv_frame(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, Status>> {
        Box::pin(async move { Ok(self.rx.recv().await) })
    }
}
