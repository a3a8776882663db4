use bytes::Bytes;
use http::{Extensions, HeaderMap};
use tracing::trace;

use crate::{Message, Status};

/// Per-call context handed to generated clients and handlers.
///
/// On the server side it carries the raw request body, which generated
/// unary handlers decode with [`Context::bind`], the request headers
/// and the path parameters captured by the matched route.
/// On the client side it is passed as-is to the [`ClientConn`].
///
/// [`ClientConn`]: crate::client::ClientConn
#[derive(Debug, Clone, Default)]
pub struct Context {
    body: Bytes,
    headers: HeaderMap,
    path_params: Vec<(String, String)>,
    extensions: Extensions,
}

impl Context {
    /// Create an empty [`Context`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the raw request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach the raw request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Attach the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add a path parameter captured from the route template.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_path_param(name, value);
        self
    }

    /// Add a path parameter captured from the route template.
    ///
    /// A parameter with the same name is overwritten.
    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.path_params.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.path_params.push((name, value)),
        }
        self
    }

    /// The raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Look up a path parameter by name.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
    }

    /// All path parameters in template order.
    pub fn path_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Extensions shared between the transport, interceptors and handlers.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to the extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Decode the request body into `M`.
    ///
    /// An empty body decodes into `M::default()`.
    /// A malformed body is reported as [`Code::InvalidArgument`].
    ///
    /// [`Code::InvalidArgument`]: crate::Code::InvalidArgument
    pub fn bind<M: Message>(&self) -> Result<M, Status> {
        if self.body.is_empty() {
            trace!("bind empty body to default {}", std::any::type_name::<M>());
            return Ok(M::default());
        }
        Ok(M::decode(self.body.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;
    use crate::Code;

    #[derive(Clone, PartialEq, prost::Message)]
    struct Greeting {
        #[prost(string, tag = "1")]
        name: String,
    }

    #[test]
    fn bind_empty_body_is_default() {
        let ctx = Context::new();
        let msg: Greeting = ctx.bind().unwrap();
        assert_eq!(msg, Greeting::default());
    }

    #[test]
    fn bind_decodes_body() {
        let body = Greeting {
            name: "glen".to_owned(),
        }
        .encode_to_vec();
        let msg: Greeting = Context::new().with_body(body).bind().unwrap();
        assert_eq!(msg.name, "glen");
    }

    #[test]
    fn bind_malformed_body() {
        let err = Context::new()
            .with_body(vec![0x0a, 0xff])
            .bind::<Greeting>()
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[test]
    fn path_params_overwrite() {
        let mut ctx = Context::new()
            .with_path_param("name", "a")
            .with_path_param("id", "1");
        ctx.set_path_param("name", "b");
        assert_eq!(ctx.path_param("name"), Some("b"));
        assert_eq!(ctx.path_param("id"), Some("1"));
        assert_eq!(ctx.path_param("missing"), None);
        assert_eq!(
            ctx.path_params().collect::<Vec<_>>(),
            vec![("name", "b"), ("id", "1")]
        );
    }
}
