use std::{any::Any, fmt};

use bytes::Bytes;

/// A message that can travel through generated REST bindings.
///
/// Blanket implemented for every [`prost::Message`] that is also
/// `Default`, `Clone`, `Send`, `Sync` and `'static`, which includes the
/// unit type used for `google.protobuf.Empty`.
pub trait Message: prost::Message + Default + Clone + Send + Sync + 'static {}

impl<T> Message for T where T: prost::Message + Default + Clone + Send + Sync + 'static {}

/// A type-erased [`Message`].
///
/// Unary handlers and interceptors exchange requests and responses as
/// `BoxMessage`, so that a single interceptor can be installed in front
/// of every method of every service.
pub struct BoxMessage {
    inner: Box<dyn Any + Send + Sync>,
    encode: fn(&(dyn Any + Send + Sync)) -> Bytes,
    type_name: &'static str,
}

fn encode_erased<M: Message>(msg: &(dyn Any + Send + Sync)) -> Bytes {
    msg.downcast_ref::<M>()
        .map(|msg| Bytes::from(msg.encode_to_vec()))
        .unwrap_or_default()
}

impl BoxMessage {
    /// Erase the type of `msg`.
    pub fn new<M: Message>(msg: M) -> Self {
        Self {
            inner: Box::new(msg),
            encode: encode_erased::<M>,
            type_name: std::any::type_name::<M>(),
        }
    }

    /// Borrow the message as `M`, if that is its concrete type.
    #[must_use]
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        self.inner.downcast_ref()
    }

    /// Take the message back as `M`.
    ///
    /// Returns the message unchanged when it is not of type `M`.
    pub fn downcast<M: Message>(self) -> Result<M, Self> {
        let Self {
            inner,
            encode,
            type_name,
        } = self;
        match inner.downcast::<M>() {
            Ok(msg) => Ok(*msg),
            Err(inner) => Err(Self {
                inner,
                encode,
                type_name,
            }),
        }
    }

    /// Returns `true` if the message is of type `M`.
    #[must_use]
    pub fn is<M: Message>(&self) -> bool {
        self.inner.is::<M>()
    }

    /// Encode the message in the protobuf wire format.
    #[must_use]
    pub fn encode_to_bytes(&self) -> Bytes {
        (self.encode)(&*self.inner)
    }

    /// Name of the concrete message type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for BoxMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxMessage")
            .field(&self.type_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;

    #[derive(Clone, PartialEq, prost::Message)]
    struct Ping {
        #[prost(string, tag = "1")]
        name: String,
    }

    #[test]
    fn downcast_roundtrip() {
        let msg = BoxMessage::new(Ping {
            name: "rama".to_owned(),
        });
        assert!(msg.is::<Ping>());
        assert!(!msg.is::<()>());
        assert_eq!(msg.downcast_ref::<Ping>().map(|p| p.name.as_str()), Some("rama"));

        let msg = msg.downcast::<()>().unwrap_err();
        let ping = msg.downcast::<Ping>().unwrap();
        assert_eq!(ping.name, "rama");
    }

    #[test]
    fn encode_matches_prost() {
        let ping = Ping {
            name: "x".to_owned(),
        };
        let msg = BoxMessage::new(ping.clone());
        assert_eq!(msg.encode_to_bytes().as_ref(), ping.encode_to_vec().as_slice());
        assert!(BoxMessage::new(()).encode_to_bytes().is_empty());
    }
}
