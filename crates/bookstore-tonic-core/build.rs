/// Builds the gRPC client and server code for `proto/bookstore.proto` using
/// `tonic-prost-build`.
///
/// Alongside the generated modules, a file descriptor set is written to
/// `OUT_DIR/bookstore_descriptor.bin` so the server can expose gRPC
/// reflection.
///
/// # Panics
///
/// Panics if code generation fails (for example when `protoc` is missing).
///
/// # Output
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("bookstore");
/// }
/// ```
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("bookstore_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/bookstore.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/bookstore.proto"], &["proto"])
        .unwrap();
}
