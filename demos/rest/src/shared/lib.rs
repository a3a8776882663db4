//! shared by all REST demos + tests for core logic
//!
//! - [`hello_world`]: bindings generated from `proto/helloworld/helloworld.proto`,
//!   routes come from the `rama.rest.http` method options;
//! - [`chat`]: a service defined in `build.rs` without any `.proto` file,
//!   generated in legacy stream mode.

use std::sync::Mutex;

pub mod hello_world {
    rama_rest::include_rest!("helloworld");

    use self::greeter_rest_server::GreeterServer;
    use rama_rest::{
        Context, Status,
        server::{ClientStreamingServer, ServerStreamingServer},
    };
    use tracing::debug;

    #[derive(Debug, Default)]
    pub struct RamaGreeter {}

    /// The name to greet: from the request, else from the `{name}` path parameter.
    fn greeted(ctx: &Context, request: HelloRequest) -> String {
        if request.name.is_empty() {
            ctx.path_param("name").unwrap_or("stranger").to_owned()
        } else {
            request.name
        }
    }

    impl GreeterServer for RamaGreeter {
        async fn say_hello(&self, ctx: Context, request: HelloRequest) -> Result<HelloReply, Status> {
            let name = greeted(&ctx, request);
            debug!("say hello to {name}");
            Ok(HelloReply {
                message: format!("Hello {name}!"),
            })
        }

        async fn say_hello_old(
            &self,
            ctx: Context,
            request: HelloRequest,
        ) -> Result<HelloReply, Status> {
            Ok(HelloReply {
                message: format!("Hi {}.", greeted(&ctx, request)),
            })
        }

        async fn list_items(
            &self,
            _ctx: Context,
            request: ListItemsRequest,
            mut stream: ServerStreamingServer<Item>,
        ) -> Result<(), Status> {
            if request.shelf.is_empty() {
                return Err(Status::invalid_argument("shelf is required"));
            }
            for index in 0..request.count {
                stream
                    .send(&Item {
                        name: format!("{}-{index}", request.shelf),
                    })
                    .await?;
            }
            Ok(())
        }

        async fn collect(
            &self,
            _ctx: Context,
            mut stream: ClientStreamingServer<Item, Summary>,
        ) -> Result<(), Status> {
            let mut count = 0;
            while stream.recv().await?.is_some() {
                count += 1;
            }
            stream.send_and_close(&Summary { count }).await
        }
    }
}

pub mod chat {
    use super::Mutex;

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct ChatMessage {
        #[prost(string, tag = "1")]
        pub room: String,
        #[prost(string, tag = "2")]
        pub from: String,
        #[prost(string, tag = "3")]
        pub text: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Room {
        #[prost(string, tag = "1")]
        pub room: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Receipt {
        #[prost(uint64, tag = "1")]
        pub sequence: u64,
    }

    rama_rest::include_rest!("chat.Chat");

    use self::chat_rest_server::{ChatServer, Chat_ConverseServer, Chat_SubscribeServer};
    use rama_rest::{Context, Status};

    /// In memory chat log shared by every room.
    #[derive(Debug, Default)]
    pub struct ChatRoom {
        log: Mutex<Vec<ChatMessage>>,
    }

    impl ChatRoom {
        fn push(&self, message: ChatMessage) -> Result<u64, Status> {
            let mut log = self
                .log
                .lock()
                .map_err(|err| Status::internal(err.to_string()))?;
            log.push(message);
            Ok(log.len() as u64)
        }

        fn history(&self, room: &str) -> Result<Vec<ChatMessage>, Status> {
            let log = self
                .log
                .lock()
                .map_err(|err| Status::internal(err.to_string()))?;
            Ok(log.iter().filter(|msg| msg.room == room).cloned().collect())
        }
    }

    impl ChatServer for ChatRoom {
        async fn post_message(
            &self,
            ctx: Context,
            mut request: ChatMessage,
        ) -> Result<Receipt, Status> {
            if let Some(room) = ctx.path_param("room") {
                request.room = room.to_owned();
            }
            let sequence = self.push(request)?;
            Ok(Receipt { sequence })
        }

        async fn subscribe(
            &self,
            _ctx: Context,
            request: Room,
            mut stream: Chat_SubscribeServer,
        ) -> Result<(), Status> {
            for message in self.history(&request.room)? {
                stream.send(&message).await?;
            }
            Ok(())
        }

        async fn converse(
            &self,
            _ctx: Context,
            mut stream: Chat_ConverseServer,
        ) -> Result<(), Status> {
            while let Some(message) = stream.recv().await? {
                self.push(message.clone())?;
                stream
                    .send(&ChatMessage {
                        from: "echo".to_owned(),
                        ..message
                    })
                    .await?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
pub mod tests;
