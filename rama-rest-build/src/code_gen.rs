//! Generic code generation for REST services.
//!
//! Both front-ends ([`crate::protobuf`] and [`crate::manual`]) describe
//! their services through the [`Service`] and [`Method`](crate::Method)
//! traits and hand them to a [`CodeGenBuilder`].

use std::collections::HashSet;

use proc_macro2::TokenStream;

use crate::{
    Error, Method, Result, Service, StreamInterfaceMode,
    client::{self, ClientContext},
    server::{self, ServerContext},
};

/// Builder for the generic code generation of servers and clients.
#[derive(Debug, Clone)]
pub struct CodeGenBuilder {
    emit_package: bool,
    compile_well_known_types: bool,
    disable_comments: HashSet<String>,
    stream_mode: StreamInterfaceMode,
    root_crate_name: TokenStream,
}

impl CodeGenBuilder {
    /// Create a new code gen builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Default::default()
    }

    crate::macros::generate_set_and_with! {
        /// Enable code generation to emit the package name
        /// in full method names and service names.
        pub fn emit_package(mut self, enable: bool) -> Self {
            self.emit_package = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Enable compiling well known types, this will force codegen to not
        /// use the well known types from `prost-types`.
        pub fn compile_well_known_types(mut self, enable: bool) -> Self {
            self.compile_well_known_types = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Disable comments based on a proto path.
        ///
        /// A path is either `{package}.{Service}` or `{package}.{Service}.{Method}`.
        pub fn disable_comments(mut self, disable_comments: HashSet<String>) -> Self {
            self.disable_comments = disable_comments;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// How streaming methods are exposed, see [`StreamInterfaceMode`].
        pub fn stream_interface_mode(mut self, mode: StreamInterfaceMode) -> Self {
            self.stream_mode = mode;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Path used by generated code to reach the `rama-rest` crate.
        ///
        /// Detected from the manifest of the crate being built by default.
        pub fn root_crate(mut self, root: TokenStream) -> Self {
            self.root_crate_name = root;
            self
        }
    }

    /// Generate client code based on `Service`.
    ///
    /// This takes some `Service` and will generate a `TokenStream` that contains
    /// a public module with the generated client.
    pub fn generate_client(&self, service: &impl Service, proto_path: &str) -> Result<TokenStream> {
        check_method_names(service)?;
        client::generate_internal(
            service,
            &ClientContext {
                emit_package: self.emit_package,
                proto_path,
                compile_well_known_types: self.compile_well_known_types,
                disable_comments: &self.disable_comments,
                stream_mode: self.stream_mode,
            },
            &self.root_crate_name,
        )
    }

    /// Generate server code based on `Service`.
    ///
    /// This takes some `Service` and will generate a `TokenStream` that contains
    /// a public module with the generated server trait, handlers and
    /// service descriptor.
    pub fn generate_server(&self, service: &impl Service, proto_path: &str) -> Result<TokenStream> {
        check_method_names(service)?;
        server::generate_internal(
            service,
            &ServerContext {
                emit_package: self.emit_package,
                proto_path,
                compile_well_known_types: self.compile_well_known_types,
                disable_comments: &self.disable_comments,
                stream_mode: self.stream_mode,
            },
            &self.root_crate_name,
        )
    }
}

impl Default for CodeGenBuilder {
    fn default() -> Self {
        Self {
            emit_package: true,
            compile_well_known_types: false,
            disable_comments: HashSet::default(),
            stream_mode: StreamInterfaceMode::default(),
            root_crate_name: crate::root_crate::root_crate_name_ts(),
        }
    }
}

/// Two methods of one service may share neither their Rust name
/// nor their identifier.
fn check_method_names(service: &impl Service) -> Result<()> {
    let mut names = HashSet::new();
    let mut identifiers = HashSet::new();
    for method in service.methods() {
        let duplicate = if !names.insert(method.name()) {
            method.name()
        } else if !identifiers.insert(method.identifier()) {
            method.identifier()
        } else {
            continue;
        };
        return Err(Error::DuplicateMethod {
            service: service.name().to_owned(),
            method: duplicate.to_owned(),
        });
    }
    Ok(())
}

/// Format generated tokens of `service` as a Rust source file.
pub(crate) fn render(service: &str, tokens: TokenStream) -> Result<String> {
    let ast: syn::File = syn::parse2(tokens).map_err(|source| Error::Syntax {
        service: service.to_owned(),
        source,
    })?;
    Ok(prettyplease::unparse(&ast))
}
