/// Include generated REST bindings.
///
/// The argument is the name of the file written by `rama-rest-build`,
/// without the `.rs` extension. For bindings generated from `.proto` files
/// that is the protobuf package name, for services defined by hand it is
/// `<package>.<service>`.
///
/// ```rust,ignore
/// mod pb {
///     rama_rest::include_rest!("helloworld");
/// }
/// ```
///
/// # Note
///
/// This only works if `rama-rest-build` wrote its output to the default
/// output directory (`OUT_DIR`).
#[macro_export]
macro_rules! include_rest {
    ($package: tt) => {
        include!(concat!(env!("OUT_DIR"), concat!("/", $package, ".rs")));
    };
}
