fn main() {
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/pulsaar.proto"], &["proto"])
        .expect("failed to compile proto/pulsaar.proto");
}
