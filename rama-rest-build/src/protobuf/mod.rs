//! Protobuf (via prost) build integration for rama-rest.
//!
//! Messages are generated by [`prost-build`], the REST bindings of every
//! service are appended to the same output file. HTTP routes come from the
//! `rama.rest.http` method option declared in the bundled
//! `rama/rest/annotations.proto`, which is always on the include path:
//!
//! ```proto
//! import "rama/rest/annotations.proto";
//!
//! service Greeter {
//!   rpc SayHello (HelloRequest) returns (HelloReply) {
//!     option (rama.rest.http) = { get: "/v1/hello" };
//!     option (rama.rest.http) = { post: "/v1/hello/{name}" };
//!   }
//! }
//! ```
//!
//! [`prost-build`]: https://github.com/tokio-rs/prost

use std::{
    cell::RefCell,
    collections::HashSet,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
    rc::Rc,
};

use proc_macro2::TokenStream;
use prost::Message as _;
use quote::ToTokens;
use tracing::{debug, error};

use crate::{
    CodeGenBuilder, Error, HttpBinding, Result, StreamInterfaceMode, code_gen::render,
};

mod descriptor;

use descriptor::HttpAnnotations;


// Re-export prost types that users might need
pub use prost_build::Config;
pub use prost_types::FileDescriptorSet;

/// Directory holding the bundled `rama/rest/annotations.proto`.
#[must_use]
pub fn include_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/proto"))
}

/// Configure `rama-rest-build` code generation.
///
/// Use [`compile_protos`] instead if you don't need to tweak anything.
#[must_use]
pub fn configure() -> RamaRestProtoBuilder {
    RamaRestProtoBuilder {
        build_client: true,
        build_server: true,
        file_descriptor_set_path: None,
        out_dir: None,
        extern_path: Vec::new(),
        field_attributes: Vec::new(),
        message_attributes: Vec::new(),
        enum_attributes: Vec::new(),
        type_attributes: Vec::new(),
        proto_path: "super".to_owned(),
        compile_well_known_types: false,
        emit_package: true,
        protoc_args: Vec::new(),
        include_file: None,
        emit_rerun_if_changed: std::env::var_os("CARGO").is_some(),
        disable_comments: HashSet::default(),
        stream_mode: StreamInterfaceMode::default(),
        root_crate: crate::root_crate::root_crate_name_ts(),
    }
}

/// Simple `.proto` compiling. Use [`configure`] instead if you need more options.
///
/// The include directory will be the parent folder of the specified path.
pub fn compile_protos(proto: impl AsRef<Path>) -> Result<()> {
    let proto_path: &Path = proto.as_ref();

    // directory the main .proto file resides in
    let proto_dir = proto_path.parent().unwrap_or_else(|| Path::new("."));

    self::configure().compile_protos(&[proto_path], &[proto_dir])
}

/// Simple encoded file descriptor set compiling.
/// Use [`configure`] instead if you need more options.
pub fn compile_encoded_fds(encoded: &[u8]) -> Result<()> {
    self::configure().compile_encoded_fds(encoded)
}

/// Non-path Rust types allowed for request/response types.
const NON_PATH_TYPE_ALLOWLIST: &[&str] = &["()"];

/// Newtype wrapper for prost to add rama-rest-specific extensions
struct RamaRestBuildService {
    prost_service: prost_build::Service,
    methods: Vec<RamaRestProtoBuildMethod>,
}

impl RamaRestBuildService {
    fn new(prost_service: prost_build::Service, annotations: &HttpAnnotations) -> Self {
        Self {
            // The rama_rest_build::Service trait specifies that methods are borrowed,
            // so they have to reified up front.
            methods: prost_service
                .methods
                .iter()
                .map(|prost_method| RamaRestProtoBuildMethod {
                    http_bindings: annotations.bindings(
                        &prost_service.package,
                        &prost_service.proto_name,
                        &prost_method.proto_name,
                    ),
                    prost_method: prost_method.clone(),
                })
                .collect(),
            prost_service,
        }
    }
}

/// Newtype wrapper for prost to add rama-rest-specific extensions
struct RamaRestProtoBuildMethod {
    prost_method: prost_build::Method,
    http_bindings: Vec<HttpBinding>,
}

impl crate::Service for RamaRestBuildService {
    type Method = RamaRestProtoBuildMethod;
    type Comment = String;

    fn name(&self) -> &str {
        &self.prost_service.name
    }

    fn package(&self) -> &str {
        &self.prost_service.package
    }

    fn identifier(&self) -> &str {
        &self.prost_service.proto_name
    }

    fn methods(&self) -> &[Self::Method] {
        &self.methods
    }

    fn comment(&self) -> &[Self::Comment] {
        &self.prost_service.comments.leading
    }

    fn deprecated(&self) -> bool {
        self.prost_service.options.deprecated()
    }
}

impl crate::Method for RamaRestProtoBuildMethod {
    type Comment = String;

    fn name(&self) -> &str {
        &self.prost_method.name
    }

    fn identifier(&self) -> &str {
        &self.prost_method.proto_name
    }

    fn client_streaming(&self) -> bool {
        self.prost_method.client_streaming
    }

    fn server_streaming(&self) -> bool {
        self.prost_method.server_streaming
    }

    fn comment(&self) -> &[Self::Comment] {
        &self.prost_method.comments.leading
    }

    fn deprecated(&self) -> bool {
        self.prost_method.options.deprecated()
    }

    fn http_bindings(&self) -> &[HttpBinding] {
        &self.http_bindings
    }

    fn request_response_name(
        &self,
        proto_path: &str,
        compile_well_known_types: bool,
    ) -> Result<(TokenStream, TokenStream)> {
        let request = convert_type(
            &self.prost_method.input_proto_type,
            &self.prost_method.input_type,
            proto_path,
            compile_well_known_types,
        )?;
        let response = convert_type(
            &self.prost_method.output_proto_type,
            &self.prost_method.output_type,
            proto_path,
            compile_well_known_types,
        )?;
        Ok((request, response))
    }
}

/// Rust type of a message, as seen from the generated modules.
fn convert_type(
    proto_type: &str,
    rust_type: &str,
    proto_path: &str,
    compile_well_known_types: bool,
) -> Result<TokenStream> {
    let invalid = |source| Error::InvalidType {
        ty: rust_type.to_owned(),
        source,
    };

    if (is_google_type(proto_type) && !compile_well_known_types)
        || rust_type.starts_with("::")
        || NON_PATH_TYPE_ALLOWLIST.contains(&rust_type)
    {
        // well known types, extern types and `()` are used as they are
        syn::parse_str::<syn::Type>(rust_type)
            .map(|ty| ty.to_token_stream())
            .map_err(invalid)
    } else if rust_type.starts_with("crate::") {
        syn::parse_str::<syn::Path>(rust_type)
            .map(|path| path.to_token_stream())
            .map_err(invalid)
    } else {
        syn::parse_str::<syn::Path>(&format!("{proto_path}::{rust_type}"))
            .map(|path| path.to_token_stream())
            .map_err(invalid)
    }
}

fn is_google_type(ty: &str) -> bool {
    ty.starts_with(".google.protobuf")
}

/// Service generator that is compatible with prost-build
#[derive(Debug)]
struct ServiceGenerator {
    build_client: bool,
    build_server: bool,
    proto_path: String,
    code_gen: CodeGenBuilder,
    annotations: Rc<HttpAnnotations>,
    errors: Rc<RefCell<Vec<Error>>>,
}

impl ServiceGenerator {
    fn generate_service(&self, service: &RamaRestBuildService) -> Result<String> {
        let mut tokens = TokenStream::new();
        if self.build_client {
            tokens.extend(self.code_gen.generate_client(service, &self.proto_path)?);
        }
        if self.build_server {
            tokens.extend(self.code_gen.generate_server(service, &self.proto_path)?);
        }
        render(&service.prost_service.name, tokens)
    }
}

impl prost_build::ServiceGenerator for ServiceGenerator {
    fn generate(&mut self, service: prost_build::Service, buf: &mut String) {
        let name = format!("{}.{}", service.package, service.proto_name);
        let service = RamaRestBuildService::new(service, &self.annotations);

        match self.generate_service(&service) {
            Ok(code) => {
                debug!("generated REST bindings for {name}");
                buf.push_str(&code);
            }
            Err(err) => {
                error!("failed to generate REST bindings for {name}: {err}");
                let message = format!("rama-rest-build: {name}: {err}");
                buf.push_str(&format!("compile_error!({message:?});\n"));
                self.errors.borrow_mut().push(err);
            }
        }
    }
}

/// Builder for configuring and generating code from `.proto` files.
#[derive(Debug, Clone)]
pub struct RamaRestProtoBuilder {
    build_client: bool,
    build_server: bool,
    file_descriptor_set_path: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    extern_path: Vec<(String, String)>,
    field_attributes: Vec<(String, String)>,
    message_attributes: Vec<(String, String)>,
    enum_attributes: Vec<(String, String)>,
    type_attributes: Vec<(String, String)>,
    proto_path: String,
    compile_well_known_types: bool,
    emit_package: bool,
    protoc_args: Vec<OsString>,
    include_file: Option<PathBuf>,
    emit_rerun_if_changed: bool,
    disable_comments: HashSet<String>,
    stream_mode: StreamInterfaceMode,
    root_crate: TokenStream,
}

impl RamaRestProtoBuilder {
    crate::macros::generate_set_and_with! {
        /// Enable or disable REST client code generation.
        pub fn build_client(mut self, enable: bool) -> Self {
            self.build_client = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Enable or disable REST server code generation.
        pub fn build_server(mut self, enable: bool) -> Self {
            self.build_server = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Configure the output directory where generated Rust files are written.
        ///
        /// If unset, defaults to the `OUT_DIR` environment variable. `OUT_DIR` is set by Cargo when
        /// executing build scripts, so `out_dir` typically does not need to be configured.
        pub fn out_dir(mut self, out_dir: impl AsRef<Path>) -> Self {
            self.out_dir = Some(out_dir.as_ref().to_path_buf());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Declare externally provided Protobuf package or type.
        ///
        /// Passed directly to `prost_build::Config.extern_path`.
        /// Note that both the Protobuf path and the rust package paths should both be fully qualified.
        /// i.e. Protobuf path should start with "." and rust path should start with "::"
        pub fn extern_path(mut self, proto_path: impl AsRef<str>, rust_path: impl AsRef<str>) -> Self {
            self.extern_path.push((
                proto_path.as_ref().to_owned(),
                rust_path.as_ref().to_owned(),
            ));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add additional attribute to matched fields.
        ///
        /// Passed directly to `prost_build::Config.field_attribute`.
        pub fn field_attribute(mut self, path: impl AsRef<str>, attribute: impl AsRef<str>) -> Self {
            self.field_attributes
                .push((path.as_ref().to_owned(), attribute.as_ref().to_owned()));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add additional attribute to matched messages.
        ///
        /// Passed directly to `prost_build::Config.message_attribute`.
        pub fn message_attribute(
            mut self,
            path: impl AsRef<str>,
            attribute: impl AsRef<str>,
        ) -> Self {
            self.message_attributes
                .push((path.as_ref().to_owned(), attribute.as_ref().to_owned()));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add additional attribute to matched enums and one-offs.
        ///
        /// Passed directly to `prost_build::Config.enum_attribute`.
        pub fn enum_attribute(
            mut self,
            path: impl AsRef<str>,
            attribute: impl AsRef<str>,
        ) -> Self {
            self.enum_attributes
                .push((path.as_ref().to_owned(), attribute.as_ref().to_owned()));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add additional attribute to matched messages, enums, and one-offs.
        ///
        /// Passed directly to `prost_build::Config.type_attribute`.
        pub fn type_attribute(
            mut self,
            path: impl AsRef<str>,
            attribute: impl AsRef<str>,
        ) -> Self {
            self.type_attributes
                .push((path.as_ref().to_owned(), attribute.as_ref().to_owned()));
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the path to where protobuf types are generated in the module tree.
        /// Default is `super`.
        ///
        /// This should be used in combination with `extern_path` when you want to use types that are
        /// defined in other crates or modules.
        pub fn proto_path(mut self, proto_path: impl AsRef<str>) -> Self {
            self.proto_path = proto_path.as_ref().to_owned();
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Enable or disable directing Protobuf to compile well-known types.
        ///
        /// Passed directly to `prost_build::Config.compile_well_known_types`.
        pub fn compile_well_known_types(mut self, enable: bool) -> Self {
            self.compile_well_known_types = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Enable or disable emitting the package in full method and service names.
        pub fn emit_package(mut self, enable: bool) -> Self {
            self.emit_package = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Also write the encoded file descriptor set to `path`.
        pub fn file_descriptor_set_path(mut self, path: impl AsRef<Path>) -> Self {
            self.file_descriptor_set_path = Some(path.as_ref().to_path_buf());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Add an additional protoc argument.
        pub fn protoc_arg(mut self, arg: impl AsRef<str>) -> Self {
            self.protoc_args.push(arg.as_ref().into());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Set the include file.
        ///
        /// Passed directly to `prost_build::Config.include_file`.
        pub fn include_file(mut self, path: impl AsRef<Path>) -> Self {
            self.include_file = Some(path.as_ref().to_path_buf());
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Emit `cargo:rerun-if-changed` for the compiled protos and include directories.
        ///
        /// Enabled by default when running under cargo.
        pub fn emit_rerun_if_changed(mut self, enable: bool) -> Self {
            self.emit_rerun_if_changed = enable;
            self
        }
    }

    crate::macros::generate_set_and_with! {
        /// Disable the doc comments of services and methods,
        /// by `{package}.{Service}` or `{package}.{Service}.{Method}` path.
        pub fn disable_comments(mut self, path: impl IntoIterator<Item: AsRef<str>>) -> Self {
            self.disable_comments
                .extend(path.into_iter().map(|s| s.as_ref().to_owned()));
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
            self.root_crate = root;
            self
        }
    }

    /// Compile the .proto files and execute code generation.
    ///
    /// `protoc` is run with the bundled [`include_dir`] appended to `includes`.
    pub fn compile_protos<P>(self, protos: &[P], includes: &[P]) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let tmp = tempfile::Builder::new()
            .prefix("rama-rest-build")
            .tempdir()?;
        let fds_path = tmp.path().join("file_descriptor_set.bin");

        let protoc = protoc_path();
        let mut cmd = Command::new(&protoc);
        cmd.arg("--include_imports")
            .arg("--include_source_info")
            .arg("-o")
            .arg(&fds_path);
        for include in includes {
            cmd.arg("-I").arg(include.as_ref());
        }
        cmd.arg("-I").arg(include_dir());
        if let Some(include) = protoc_include() {
            cmd.arg("-I").arg(include);
        }
        for arg in &self.protoc_args {
            cmd.arg(arg);
        }
        for proto in protos {
            cmd.arg(proto.as_ref());
        }

        debug!("running protoc: {cmd:?}");
        let output = cmd.output().map_err(|err| {
            Error::Protoc(format!(
                "failed to invoke protoc ({}): {err}",
                protoc.display()
            ))
        })?;
        if !output.status.success() {
            return Err(Error::Protoc(format!(
                "protoc failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let encoded = fs::read(&fds_path).map_err(Error::io(&fds_path))?;

        if self.emit_rerun_if_changed {
            emit_rerun_if_changed(protos, includes);
        }

        self.compile_encoded_fds(&encoded)
    }

    /// Compile an encoded `FileDescriptorSet` and execute code generation.
    ///
    /// The set must be encoded by `protoc` (`--include_imports
    /// --include_source_info -o`), it is decoded once for the messages and
    /// once for the `rama.rest.http` method options.
    pub fn compile_encoded_fds(self, encoded: &[u8]) -> Result<()> {
        let annotations = HttpAnnotations::decode(encoded)?;
        let fds = FileDescriptorSet::decode(encoded)?;

        if let Some(path) = &self.file_descriptor_set_path {
            fs::write(path, encoded).map_err(Error::io(path))?;
        }

        self.generate(fds, annotations)
    }

    /// Compile a decoded [`prost_types::FileDescriptorSet`] and execute code generation.
    ///
    /// `prost-types` drops extension options while decoding: no route is
    /// generated from such a set. Use [`Self::compile_encoded_fds`] to keep them.
    pub fn compile_fds(self, fds: FileDescriptorSet) -> Result<()> {
        debug!("compiling decoded file descriptor set: http options are not available");
        self.generate(fds, HttpAnnotations::default())
    }

    /// Turn the builder into a `ServiceGenerator` ready to be passed to `prost-build`s
    /// `Config::service_generator`.
    ///
    /// Services are generated without routes, and failures are reported
    /// through a `compile_error!` in the generated file only.
    #[must_use]
    pub fn service_generator(self) -> Box<dyn prost_build::ServiceGenerator> {
        Box::new(self.into_generator(Rc::default(), Rc::default()))
    }

    fn into_generator(
        self,
        annotations: Rc<HttpAnnotations>,
        errors: Rc<RefCell<Vec<Error>>>,
    ) -> ServiceGenerator {
        let code_gen = CodeGenBuilder::new()
            .with_emit_package(self.emit_package)
            .with_compile_well_known_types(self.compile_well_known_types)
            .with_disable_comments(self.disable_comments)
            .with_stream_interface_mode(self.stream_mode)
            .with_root_crate(self.root_crate);

        ServiceGenerator {
            build_client: self.build_client,
            build_server: self.build_server,
            proto_path: self.proto_path,
            code_gen,
            annotations,
            errors,
        }
    }

    fn prost_config(&self) -> Result<Config> {
        let out_dir = match &self.out_dir {
            Some(out_dir) => out_dir.clone(),
            None => std::env::var_os("OUT_DIR")
                .map(PathBuf::from)
                .ok_or(Error::OutDir)?,
        };

        let mut config = Config::new();
        config.out_dir(out_dir);

        for (proto_path, rust_path) in &self.extern_path {
            config.extern_path(proto_path, rust_path);
        }

        for (prost_path, attr) in &self.field_attributes {
            config.field_attribute(prost_path, attr);
        }

        for (prost_path, attr) in &self.message_attributes {
            config.message_attribute(prost_path, attr);
        }

        for (prost_path, attr) in &self.enum_attributes {
            config.enum_attribute(prost_path, attr);
        }

        for (prost_path, attr) in &self.type_attributes {
            config.type_attribute(prost_path, attr);
        }

        if self.compile_well_known_types {
            config.compile_well_known_types();
        }

        if let Some(path) = &self.include_file {
            config.include_file(path);
        }

        Ok(config)
    }

    fn generate(self, fds: FileDescriptorSet, annotations: HttpAnnotations) -> Result<()> {
        let mut config = self.prost_config()?;
        let errors: Rc<RefCell<Vec<Error>>> = Rc::default();

        if self.build_client || self.build_server {
            let generator = self.into_generator(Rc::new(annotations), Rc::clone(&errors));
            config.service_generator(Box::new(generator));
        }

        config.compile_fds(fds)?;

        errors.take().into_iter().next().map_or(Ok(()), Err)
    }
}

fn protoc_path() -> PathBuf {
    #[cfg(feature = "vendor-protoc")]
    match protoc_bin_vendored::protoc_bin_path() {
        Ok(path) => return path,
        Err(err) => {
            tracing::warn!("failed to get protoc bin path (falling back to system install): {err}");
        }
    }

    prost_build::protoc_from_env()
}

/// Include directory holding `google/protobuf/descriptor.proto`.
fn protoc_include() -> Option<PathBuf> {
    #[cfg(feature = "vendor-protoc")]
    if let Ok(path) = protoc_bin_vendored::include_path() {
        return Some(path);
    }

    prost_build::protoc_include_from_env()
}

#[expect(clippy::print_stdout, reason = "cargo build script directive")]
fn emit_rerun_if_changed<P: AsRef<Path>>(protos: &[P], includes: &[P]) {
    for path in protos.iter().chain(includes) {
        println!("cargo:rerun-if-changed={}", path.as_ref().display());
    }
}
