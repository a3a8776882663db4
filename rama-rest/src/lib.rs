//! # rama-rest
//!
//! REST-flavored rpc support for Rama.
//!
//! This crate is the contract that code generated by
//! [`rama-rest-build`](https://docs.rs/rama-rest-build) is written against.
//! It does not move bytes over the network by itself: a transport implements
//! [`client::ClientConn`] for outgoing calls and drives the route tables
//! ([`server::ServiceDesc`]) for incoming requests.
//!
//! ## Structure
//!
//! - [`client`]: the transport handle used by generated clients, the call
//!   options and the generic stream handles returned for streaming methods.
//! - [`server`]: interceptors, handler descriptors and the generic server
//!   streams handed to service implementations.
//! - [`Context`]: the per-call request context, carrying the request body
//!   which is decoded by generated handlers.
//! - [`Status`]: the error type of every generated call and handler.
//!
//! Generated code is included with [`include_rest!`]:
//!
//! ```rust,ignore
//! pub mod hello_world {
//!     rama_rest::include_rest!("helloworld");
//! }
//! ```
//!
//! ## Rama
//!
//! Crate used by the end-user `rama` crate and `rama` crate authors alike.
//!
//! Learn more about `rama`:
//!
//! - Github: <https://github.com/plabayo/rama>
//! - Book: <https://ramaproxy.org/book/>

#![doc(
    html_favicon_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png"
)]
#![doc(html_logo_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod client;
pub mod server;
pub mod shape;

mod context;
mod macros;
mod message;
mod status;

pub use context::Context;
pub use message::{BoxMessage, Message};
pub use status::{Code, Status};

#[doc(hidden)]
pub mod codegen;

/// Protocol tag reported to interceptors through
/// [`UnaryServerInfo::protocol`](server::UnaryServerInfo::protocol).
pub const PROTOCOL: &str = "rest";

/// `Result` is a type that represents either success ([`Ok`]) or failure ([`Err`]).
/// By default, the Err value is of type [`Status`] but this can be overridden if desired.
pub type Result<T, E = Status> = std::result::Result<T, E>;
