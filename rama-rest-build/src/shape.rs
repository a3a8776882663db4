//! Classification of methods by message multiplicity.

use crate::Method;

/// The streaming shape of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamShape {
    /// One request, one response.
    Unary,
    /// A stream of requests, one response.
    ClientStreaming,
    /// One request, a stream of responses.
    ServerStreaming,
    /// A stream of requests and a stream of responses.
    Bidi,
}

impl StreamShape {
    /// Classify a method by its two streaming flags.
    #[must_use]
    pub const fn classify(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => Self::Unary,
            (true, false) => Self::ClientStreaming,
            (false, true) => Self::ServerStreaming,
            (true, true) => Self::Bidi,
        }
    }

    /// Shape of `method`.
    pub fn of<M: Method>(method: &M) -> Self {
        Self::classify(method.client_streaming(), method.server_streaming())
    }

    /// Anything but [`StreamShape::Unary`].
    #[must_use]
    pub const fn is_streaming(self) -> bool {
        !matches!(self, Self::Unary)
    }

    /// The client sends a stream of messages.
    #[must_use]
    pub const fn client_streams(self) -> bool {
        matches!(self, Self::ClientStreaming | Self::Bidi)
    }

    /// The server sends a stream of messages.
    #[must_use]
    pub const fn server_streams(self) -> bool {
        matches!(self, Self::ServerStreaming | Self::Bidi)
    }

    /// Name of the generic client stream type in `rama_rest::client`.
    #[must_use]
    pub const fn generic_client_type(self) -> Option<&'static str> {
        match self {
            Self::Unary => None,
            Self::ClientStreaming => Some("ClientStreamingClient"),
            Self::ServerStreaming => Some("ServerStreamingClient"),
            Self::Bidi => Some("BidiStreamingClient"),
        }
    }

    /// Name of the generic server stream type in `rama_rest::server`.
    #[must_use]
    pub const fn generic_server_type(self) -> Option<&'static str> {
        match self {
            Self::Unary => None,
            Self::ClientStreaming => Some("ClientStreamingServer"),
            Self::ServerStreaming => Some("ServerStreamingServer"),
            Self::Bidi => Some("BidiStreamingServer"),
        }
    }
}

/// Index of every streaming method among the streaming methods of a
/// service, in declaration order. `None` for unary methods.
pub(crate) fn stream_indices<M: Method>(methods: &[M]) -> Vec<Option<usize>> {
    let mut next = 0;
    methods
        .iter()
        .map(|method| {
            StreamShape::of(method).is_streaming().then(|| {
                let index = next;
                next += 1;
                index
            })
        })
        .collect()
}
