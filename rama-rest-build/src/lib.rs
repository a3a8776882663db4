//! REST binding codegen for rama.
//!
//! `rama-rest-build` compiles service definitions into client and server
//! bindings for the [`rama-rest`] transport contract. Each method is
//! classified by its [`StreamShape`]; unary methods carrying `http`
//! annotations are additionally registered in a route table mapping
//! HTTP verb and path pairs to the generated handlers.
//!
//! Two front-ends feed the same code generator:
//!
//! - [`protobuf`]: compiles `.proto` files (with the bundled
//!   `rama/rest/annotations.proto` for the `rama.rest.http` method option)
//!   using `prost-build` for the messages;
//! - [`manual`]: define services in Rust, without `.proto` files.
//!
//! ## Streams
//!
//! Streaming methods are exposed through the generic stream types of
//! [`rama-rest`] by default. [`StreamInterfaceMode::Legacy`] generates a
//! named trait and wrapper type per streaming method instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! // build.rs
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     rama_rest_build::protobuf::configure()
//!         .compile_protos(&["proto/helloworld/helloworld.proto"], &["proto"])?;
//!     Ok(())
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
//!
//! [`rama-rest`]: https://docs.rs/rama-rest

#![doc(
    html_favicon_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png"
)]
#![doc(html_logo_url = "https://raw.githubusercontent.com/plabayo/rama/main/docs/img/old_logo.png")]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::fmt;

use proc_macro2::TokenStream;
use quote::quote;

mod macros;

mod client;
mod code_gen;
mod error;
mod root_crate;
mod server;

pub mod manual;
pub mod naming;
pub mod route;
pub mod shape;

#[cfg(feature = "protobuf")]
#[cfg_attr(docsrs, doc(cfg(feature = "protobuf")))]
pub mod protobuf;

pub use code_gen::CodeGenBuilder;
pub use error::{Error, Result};
pub use route::{RouteEntry, RouteTable};
pub use shape::StreamShape;

/// Service generation trait.
///
/// This trait can be implemented and consumed
/// by `rama-rest-build` to generate bindings for
/// a service.
pub trait Service {
    /// Comment type.
    type Comment: AsRef<str>;

    /// Method type.
    type Method: Method;

    /// Name of service, in Rust style.
    fn name(&self) -> &str;
    /// Package name of service.
    fn package(&self) -> &str;
    /// Identifier used to generate type name.
    fn identifier(&self) -> &str;
    /// Methods provided by service, in declaration order.
    fn methods(&self) -> &[Self::Method];
    /// Get comments about this item.
    fn comment(&self) -> &[Self::Comment];
    /// Service is deprecated.
    fn deprecated(&self) -> bool {
        false
    }
}

/// Method generation trait.
///
/// Each service contains a set of generic
/// `Methods`'s that will be used by the generator
/// to generate client and server bindings.
pub trait Method {
    /// Comment type.
    type Comment: AsRef<str>;

    /// Name of method, in Rust style.
    fn name(&self) -> &str;
    /// Identifier used to generate type name.
    fn identifier(&self) -> &str;
    /// Method is streamed by client.
    fn client_streaming(&self) -> bool;
    /// Method is streamed by server.
    fn server_streaming(&self) -> bool;
    /// Get comments about this item.
    fn comment(&self) -> &[Self::Comment];
    /// Method is deprecated.
    fn deprecated(&self) -> bool {
        false
    }
    /// HTTP bindings of this method, in declaration order.
    fn http_bindings(&self) -> &[HttpBinding];
    /// Type name of request and response.
    fn request_response_name(
        &self,
        proto_path: &str,
        compile_well_known_types: bool,
    ) -> Result<(TokenStream, TokenStream)>;
}

/// HTTP verb of an [`HttpBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// `HEAD`
    Head,
}

impl HttpVerb {
    /// The verb as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
        }
    }

    /// Tokens of the matching `http::Method` constant, reached through `root`.
    pub(crate) fn method_tokens(self, root: &TokenStream) -> TokenStream {
        let method = match self {
            Self::Get => quote!(GET),
            Self::Put => quote!(PUT),
            Self::Post => quote!(POST),
            Self::Delete => quote!(DELETE),
            Self::Patch => quote!(PATCH),
            Self::Head => quote!(HEAD),
        };
        quote!(#root::codegen::Method::#method)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single HTTP route annotation of a method: a verb and a path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpBinding {
    verb: HttpVerb,
    path: String,
}

impl HttpBinding {
    /// Create a new binding.
    pub fn new(verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
        }
    }

    /// The HTTP verb.
    #[must_use]
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// The path template, e.g. `/v1/items/{id}`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// How streaming methods are exposed by generated clients and servers.
///
/// Set once per generator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamInterfaceMode {
    /// Use the generic stream types of `rama-rest`,
    /// with a `{Service}_{Method}Client` alias per streaming method.
    #[default]
    Generic,
    /// Emit a named trait and a wrapper type per streaming method,
    /// exposing only the operations its shape allows.
    Legacy,
}

fn generate_doc_comment<S: AsRef<str>>(comment: S) -> TokenStream {
    let comment = comment.as_ref();
    let comment = if comment.starts_with(' ') || comment.is_empty() {
        comment.to_owned()
    } else {
        format!(" {comment}")
    };
    quote!(#[doc = #comment])
}

// Generate a doc comment for each line of `comments`.
fn generate_doc_comments<T: AsRef<str>>(comments: &[T]) -> TokenStream {
    let mut stream = TokenStream::new();

    for comment in comments {
        stream.extend(generate_doc_comment(comment));
    }

    stream
}

fn generate_deprecated(deprecated: bool) -> TokenStream {
    if deprecated {
        quote!(#[deprecated])
    } else {
        TokenStream::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_comment_gets_leading_space() {
        assert_eq!(
            generate_doc_comment("hello").to_string(),
            quote!(#[doc = " hello"]).to_string()
        );
        assert_eq!(
            generate_doc_comment(" hello").to_string(),
            quote!(#[doc = " hello"]).to_string()
        );
    }

    #[test]
    fn verb_display() {
        assert_eq!(HttpVerb::Delete.to_string(), "DELETE");
        assert_eq!(
            HttpVerb::Get.method_tokens(&quote!(::rama_rest)).to_string(),
            quote!(::rama_rest::codegen::Method::GET).to_string()
        );
    }
}
