//! Error type of the binding compiler.
//!
//! Every malformed input is a hard failure at generation time:
//! nothing is written for a file that failed to generate.

use std::{io, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while generating REST bindings.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A manual builder was finished without a required field.
    #[error("{item} is missing required field `{field}`")]
    MissingField {
        item: &'static str,
        field: &'static str,
    },

    /// An `http` method option without a verb selector.
    #[error("method {service}.{method}: http annotation #{index} has no recognized verb pattern")]
    MissingHttpPattern {
        service: String,
        method: String,
        index: usize,
    },

    /// Two services with the same name in one package.
    #[error("duplicate service `{service}` in package `{package}`")]
    DuplicateService { package: String, service: String },

    /// Two methods with the same name in one service.
    #[error("duplicate method `{method}` in service `{service}`")]
    DuplicateMethod { service: String, method: String },

    /// A request or response type that is not a valid Rust type path.
    #[error("invalid rust type `{ty}`: {source}")]
    InvalidType {
        ty: String,
        #[source]
        source: syn::Error,
    },

    /// A manual service or method name that is not a valid Rust identifier.
    #[error("invalid rust identifier `{name}`: {source}")]
    InvalidIdent {
        name: String,
        #[source]
        source: syn::Error,
    },

    /// Generated tokens did not form a valid Rust file.
    #[error("generated code for {service} is not valid rust: {source}")]
    Syntax {
        service: String,
        #[source]
        source: syn::Error,
    },

    /// The encoded file descriptor set could not be decoded.
    #[cfg(feature = "protobuf")]
    #[error("decode file descriptor set: {0}")]
    Decode(#[from] prost::DecodeError),

    /// `protoc` failed or could not be run.
    #[error("protoc: {0}")]
    Protoc(String),

    /// No output directory was configured and `OUT_DIR` is not set.
    #[error("no output directory: set one explicitly or run from a build script (OUT_DIR)")]
    OutDir,

    /// Reading or writing files failed.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `prost-build` failed.
    #[error(transparent)]
    Build(#[from] io::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Build(err) => err,
            Error::Io { source, .. } => source,
            err => Self::other(err),
        }
    }
}
