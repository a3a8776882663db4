//! This module provides utilities for generating `rama-rest` service bindings
//! purely in Rust without the need of `proto` files.
//!
//! Messages used by manual services only need to implement `prost::Message`,
//! they can be written by hand with `#[derive(prost::Message)]`.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use proc_macro2::TokenStream;
use quote::ToTokens;
use tracing::debug;

use crate::{
    CodeGenBuilder, Error, HttpBinding, HttpVerb, Result, StreamInterfaceMode, code_gen::render,
};

/// Service builder.
///
/// This builder can be used to manually define a REST service in rust code without the use of a
/// .proto file.
#[derive(Debug, Default)]
pub struct RamaRestServiceBuilder {
    /// The service name in Rust style.
    name: Option<String>,
    /// The package name as it appears in the .proto file.
    package: Option<String>,
    /// The service comments.
    comments: Vec<String>,
    /// The service methods.
    methods: Vec<RamaRestMethod>,
    /// Identifies if the service is deprecated.
    deprecated: bool,
}

impl RamaRestServiceBuilder {
    crate::macros::generate_set_and_with! {
        /// Set the name for this Service.
        ///
        /// This value will be used both as the base for the generated rust types and service trait as
        /// well as part of the full method names of this service, which have the form
        /// `/<package_name>.<service_name>/<method_route_name>`.
        pub fn name(mut self, name: impl AsRef<str>) -> Self {
            self.name = Some(name.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the package this Service is part of.
        pub fn package(mut self, package: impl AsRef<str>) -> Self {
            self.package = Some(package.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a comment string that should be included as a doc comment for this Service.
        pub fn comment(mut self, comment: impl AsRef<str>) -> Self {
            self.comments.push(comment.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Adds a Method to this Service.
        pub fn method(mut self, method: RamaRestMethod) -> Self {
            self.methods.push(method);
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Mark the Service as deprecated.
        pub fn deprecated(mut self) -> Self {
            self.deprecated = true;
            self
        }
    }

    /// Build a Service.
    ///
    /// Fails if `name` or `package` weren't set, if the name is not a valid
    /// Rust identifier or if two methods share a name or a route name.
    pub fn build(self) -> Result<Service> {
        let name = self.name.ok_or(Error::MissingField {
            item: "service",
            field: "name",
        })?;
        let package = self.package.ok_or(Error::MissingField {
            item: "service",
            field: "package",
        })?;
        validate_ident(&name)?;

        let mut names = HashSet::new();
        let mut route_names = HashSet::new();
        for method in &self.methods {
            let duplicate = if !route_names.insert(method.route_name.as_str()) {
                &method.route_name
            } else if !names.insert(method.name.as_str()) {
                &method.name
            } else {
                continue;
            };
            return Err(Error::DuplicateMethod {
                service: name,
                method: duplicate.clone(),
            });
        }

        Ok(Service {
            name,
            package,
            comments: self.comments,
            methods: self.methods,
            deprecated: self.deprecated,
        })
    }
}

/// A service descriptor.
#[derive(Debug, Clone)]
pub struct Service {
    /// The service name in Rust style.
    name: String,
    /// The package name as it appears in the .proto file.
    package: String,
    /// The service comments.
    comments: Vec<String>,
    /// The service methods.
    methods: Vec<RamaRestMethod>,
    /// Identifies if the service is deprecated.
    deprecated: bool,
}

impl Service {
    /// Create a new `ServiceBuilder`
    #[must_use]
    pub fn builder() -> RamaRestServiceBuilder {
        RamaRestServiceBuilder::default()
    }
}

impl crate::Service for Service {
    type Comment = String;

    type Method = RamaRestMethod;

    fn name(&self) -> &str {
        &self.name
    }

    fn package(&self) -> &str {
        &self.package
    }

    fn identifier(&self) -> &str {
        &self.name
    }

    fn methods(&self) -> &[Self::Method] {
        &self.methods
    }

    fn comment(&self) -> &[Self::Comment] {
        &self.comments
    }

    fn deprecated(&self) -> bool {
        self.deprecated
    }
}

/// A service method descriptor.
#[derive(Debug, Clone)]
pub struct RamaRestMethod {
    /// The name of the method in Rust style.
    name: String,
    /// The name of the method as should be used when constructing a full method name.
    route_name: String,
    /// The method comments.
    comments: Vec<String>,
    /// The input Rust type.
    input_type: String,
    /// The output Rust type.
    output_type: String,
    /// Identifies if client streams multiple client messages.
    client_streaming: bool,
    /// Identifies if server streams multiple server messages.
    server_streaming: bool,
    /// Identifies if the method is deprecated.
    deprecated: bool,
    /// HTTP routes of the method.
    http_bindings: Vec<HttpBinding>,
}

impl RamaRestMethod {
    /// Create a new `MethodBuilder`
    #[must_use]
    pub fn builder() -> RamaRestMethodBuilder {
        RamaRestMethodBuilder::default()
    }
}

impl crate::Method for RamaRestMethod {
    type Comment = String;

    fn name(&self) -> &str {
        &self.name
    }

    fn identifier(&self) -> &str {
        &self.route_name
    }

    fn client_streaming(&self) -> bool {
        self.client_streaming
    }

    fn server_streaming(&self) -> bool {
        self.server_streaming
    }

    fn comment(&self) -> &[Self::Comment] {
        &self.comments
    }

    fn deprecated(&self) -> bool {
        self.deprecated
    }

    fn http_bindings(&self) -> &[HttpBinding] {
        &self.http_bindings
    }

    fn request_response_name(
        &self,
        _proto_path: &str,
        _compile_well_known_types: bool,
    ) -> Result<(TokenStream, TokenStream)> {
        Ok((parse_type(&self.input_type)?, parse_type(&self.output_type)?))
    }
}

/// Method builder.
///
/// This builder can be used to manually define a REST method, which can be added to a
/// REST service, in rust code without the use of a .proto file.
#[derive(Debug, Default)]
pub struct RamaRestMethodBuilder {
    /// The name of the method in Rust style.
    name: Option<String>,
    /// The name of the method as should be used when constructing a full method name.
    route_name: Option<String>,
    /// The method comments.
    comments: Vec<String>,
    /// The input Rust type.
    input_type: Option<String>,
    /// The output Rust type.
    output_type: Option<String>,
    /// Identifies if client streams multiple client messages.
    client_streaming: bool,
    /// Identifies if server streams multiple server messages.
    server_streaming: bool,
    /// Identifies if the method is deprecated.
    deprecated: bool,
    /// HTTP routes of the method.
    http_bindings: Vec<HttpBinding>,
}

impl RamaRestMethodBuilder {
    crate::macros::generate_set_and_with! {
        /// Set the name for this Method.
        ///
        /// This value will be used for generating the client functions for calling this Method.
        ///
        /// Generally this is formatted in snake_case.
        pub fn name(mut self, name: impl AsRef<str>) -> Self {
            self.name = Some(name.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the route_name for this Method.
        ///
        /// This value is the `{Method}` part of the generated names and
        /// of the full method name `/<package_name>.<service_name>/<method_route_name>`.
        ///
        /// Generally this is formatted in PascalCase.
        pub fn route_name(mut self, route_name: impl AsRef<str>) -> Self {
            self.route_name = Some(route_name.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a comment string that should be included as a doc comment for this Method.
        pub fn comment(mut self, comment: impl AsRef<str>) -> Self {
            self.comments.push(comment.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the path to the Rust type that should be use for the Request type of this method.
        pub fn input_type(mut self, input_type: impl AsRef<str>) -> Self {
            self.input_type = Some(input_type.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the path to the Rust type that should be use for the Response type of this method.
        pub fn output_type(mut self, output_type: impl AsRef<str>) -> Self {
            self.output_type = Some(output_type.as_ref().to_owned());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Sets if the Method request from the client is streamed.
        pub fn client_streaming(mut self) -> Self {
            self.client_streaming = true;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Sets if the Method response from the server is streamed.
        pub fn server_streaming(mut self) -> Self {
            self.server_streaming = true;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Mark the Method as deprecated.
        pub fn deprecated(mut self) -> Self {
            self.deprecated = true;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add an HTTP route for this Method.
        ///
        /// Routes are only registered for unary methods.
        pub fn http(mut self, verb: HttpVerb, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(verb, path));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a `GET` route for this Method.
        pub fn get(mut self, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(HttpVerb::Get, path));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a `PUT` route for this Method.
        pub fn put(mut self, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(HttpVerb::Put, path));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a `POST` route for this Method.
        pub fn post(mut self, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(HttpVerb::Post, path));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a `DELETE` route for this Method.
        pub fn delete(mut self, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(HttpVerb::Delete, path));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a `PATCH` route for this Method.
        pub fn patch(mut self, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(HttpVerb::Patch, path));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add a `HEAD` route for this Method.
        pub fn head(mut self, path: impl Into<String>) -> Self {
            self.http_bindings.push(HttpBinding::new(HttpVerb::Head, path));
            self
        }
    }

    /// Build a Method.
    ///
    /// Fails if `name`, `route_name`, `input_type` or `output_type` weren't set,
    /// or if any of them is not valid Rust.
    pub fn build(self) -> Result<RamaRestMethod> {
        let missing = |field| Error::MissingField {
            item: "method",
            field,
        };

        let name = self.name.ok_or_else(|| missing("name"))?;
        let route_name = self.route_name.ok_or_else(|| missing("route_name"))?;
        let input_type = self.input_type.ok_or_else(|| missing("input_type"))?;
        let output_type = self.output_type.ok_or_else(|| missing("output_type"))?;

        validate_ident(&name)?;
        validate_ident(&route_name)?;
        parse_type(&input_type)?;
        parse_type(&output_type)?;

        Ok(RamaRestMethod {
            name,
            route_name,
            comments: self.comments,
            input_type,
            output_type,
            client_streaming: self.client_streaming,
            server_streaming: self.server_streaming,
            deprecated: self.deprecated,
            http_bindings: self.http_bindings,
        })
    }
}

fn validate_ident(name: &str) -> Result<()> {
    syn::parse_str::<syn::Ident>(name)
        .map(drop)
        .map_err(|source| Error::InvalidIdent {
            name: name.to_owned(),
            source,
        })
}

fn parse_type(ty: &str) -> Result<TokenStream> {
    syn::parse_str::<syn::Type>(ty)
        .map(|ty| ty.to_token_stream())
        .map_err(|source| Error::InvalidType {
            ty: ty.to_owned(),
            source,
        })
}

/// Service generator builder.
#[derive(Debug)]
pub struct RamaRestBuilder {
    build_server: bool,
    build_client: bool,
    emit_package: bool,
    stream_mode: StreamInterfaceMode,
    root_crate_name: Option<TokenStream>,

    out_dir: Option<PathBuf>,
}

impl Default for RamaRestBuilder {
    fn default() -> Self {
        Self {
            build_server: true,
            build_client: true,
            emit_package: true,
            stream_mode: StreamInterfaceMode::default(),
            root_crate_name: None,
            out_dir: None,
        }
    }
}

impl RamaRestBuilder {
    /// Create a new Builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    crate::macros::generate_set_and_with! {
        /// Enable or disable REST client code generation.
        ///
        /// Defaults to enabling client code generation.
        pub fn build_client(mut self, enable: bool) -> Self {
            self.build_client = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Enable or disable REST server code generation.
        ///
        /// Defaults to enabling server code generation.
        pub fn build_server(mut self, enable: bool) -> Self {
            self.build_server = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Emit the package name in full method names and service names.
        ///
        /// Defaults to `true`.
        pub fn emit_package(mut self, enable: bool) -> Self {
            self.emit_package = enable;
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
        pub fn root_crate(mut self, root: TokenStream) -> Self {
            self.root_crate_name = Some(root);
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the output directory to generate code to.
        ///
        /// Defaults to the `OUT_DIR` environment variable.
        pub fn out_dir(mut self, out_dir: impl AsRef<Path>) -> Self {
            self.out_dir = Some(out_dir.as_ref().to_path_buf());
            self
        }
    }

    /// Performs code generation for the provided services.
    ///
    /// Generated services will be output into the directory specified by `out_dir`
    /// with files named `<package_name>.<service_name>.rs`. All services are
    /// generated before anything is written: on error no file is touched.
    pub fn compile(self, services: &[Service]) -> Result<()> {
        let out_dir = match self.out_dir {
            Some(ref out_dir) => out_dir.clone(),
            None => std::env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or(Error::OutDir)?,
        };

        let mut seen = HashSet::new();
        for service in services {
            if !seen.insert((service.package.as_str(), service.name.as_str())) {
                return Err(Error::DuplicateService {
                    package: service.package.clone(),
                    service: service.name.clone(),
                });
            }
        }

        let mut code_gen = CodeGenBuilder::new()
            .with_emit_package(self.emit_package)
            .with_compile_well_known_types(false)
            .with_stream_interface_mode(self.stream_mode);
        if let Some(root) = self.root_crate_name {
            code_gen.set_root_crate(root);
        }

        let mut files = Vec::with_capacity(services.len());
        for service in services {
            let mut tokens = TokenStream::new();
            if self.build_client {
                tokens.extend(code_gen.generate_client(service, "")?);
            }
            if self.build_server {
                tokens.extend(code_gen.generate_server(service, "")?);
            }
            let code = format!("{}{}", file_header(service), render(&service.name, tokens)?);
            let out_file = out_dir.join(format!("{}.{}.rs", service.package, service.name));
            files.push((out_file, code));
        }

        for (out_file, code) in files {
            debug!("writing {}", out_file.display());
            fs::write(&out_file, code).map_err(Error::io(out_file))?;
        }
        Ok(())
    }
}

/// Banner of a generated file, in the manner of the `prost-build` output.
fn file_header(service: &Service) -> String {
    let mut header = String::from("// This file is @generated by rama-rest-build. DO NOT EDIT.\n");
    if service.deprecated {
        header.push_str(&format!(
            "// {}.{} is a deprecated service.\n",
            service.package, service.name
        ));
    } else {
        header.push_str(&format!("// source: {}.{}\n", service.package, service.name));
    }
    header.push('\n');
    header
}
