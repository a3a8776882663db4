use std::{fs, path::PathBuf};

fn generated(file: &str) -> String {
    let path = PathBuf::from(std::env::var("OUT_DIR").unwrap()).join(file);
    fs::read_to_string(path)
        .unwrap()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// whitespace and trailing comma insensitive
fn squashed(file: &str) -> String {
    generated(file)
        .replace(' ', "")
        .replace(",>", ">")
        .replace(",)", ")")
}

#[test]
fn deprecated_methods() {
    let s = generated("helloworld.rs");
    assert!(s.contains("#[deprecated] pub async fn say_hello_old("));
    assert!(!s.contains("#[deprecated] pub async fn say_hello("));
}

#[test]
fn method_comments_become_docs() {
    let s = generated("helloworld.rs");
    assert!(s.contains("/// Sends a greeting"));
    assert!(s.contains("/// The greeting service definition."));
}

#[test]
fn generic_stream_aliases() {
    let s = squashed("helloworld.rs");
    assert!(s.contains("pubtypeGreeter_ListItemsClient<S>=ServerStreamingClient<S,super::Item>;"));
    assert!(s.contains("pubtypeGreeter_CollectClient<S>=ClientStreamingClient<S,super::Item,super::Summary>;"));
    assert!(!s.contains("pubtraitGreeter_ListItemsClient"));
}

#[test]
fn legacy_stream_types() {
    let s = squashed("chat.Chat.rs");
    assert!(s.contains("pubtraitChat_SubscribeClient:ClientStream"));
    assert!(s.contains("pubstructchatSubscribeClient<S>"));
    assert!(s.contains("pubtypeChat_SubscribeServer=ServerStreamingServer<crate::chat::ChatMessage>;"));
    assert!(!s.contains("pubtypeChat_SubscribeClient<S>"));
}
