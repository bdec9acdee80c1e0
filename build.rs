fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile the Content service definition; server and client stubs are both
    // generated (the client is used by integration tooling).
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/content.proto"], &["proto"])?;

    Ok(())
}
