use std::{env, path::PathBuf};

use rama_rest_build::{
    StreamInterfaceMode,
    manual::{RamaRestBuilder, RamaRestMethod, Service},
};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    rama_rest_build::protobuf::configure()
        .with_file_descriptor_set_path(out_dir.join("helloworld_descriptor.bin"))
        .compile_protos(&["proto/helloworld/helloworld.proto"], &["proto"])
        .unwrap();

    let chat = Service::builder()
        .with_name("Chat")
        .with_package("chat")
        .with_comment(" A chat room.")
        .with_method(
            RamaRestMethod::builder()
                .with_name("post_message")
                .with_route_name("PostMessage")
                .with_comment(" Posts a message to a room")
                .with_input_type("crate::chat::ChatMessage")
                .with_output_type("crate::chat::Receipt")
                .with_post("/v1/rooms/{room}/messages")
                .build()
                .unwrap(),
        )
        .with_method(
            RamaRestMethod::builder()
                .with_name("subscribe")
                .with_route_name("Subscribe")
                .with_input_type("crate::chat::Room")
                .with_output_type("crate::chat::ChatMessage")
                .with_server_streaming()
                .build()
                .unwrap(),
        )
        .with_method(
            RamaRestMethod::builder()
                .with_name("converse")
                .with_route_name("Converse")
                .with_input_type("crate::chat::ChatMessage")
                .with_output_type("crate::chat::ChatMessage")
                .with_client_streaming()
                .with_server_streaming()
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    RamaRestBuilder::new()
        .with_stream_interface_mode(StreamInterfaceMode::Legacy)
        .compile(&[chat])
        .unwrap();
}
