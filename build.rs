fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile the provider gRPC protocol definition (protocol version 5.x).
    let mut config = prost_build::Config::new();
    config.disable_comments(["."]);

    tonic_build::configure()
        .build_server(false) // We only need the client side
        .compile_protos_with_config(config, &["proto/tfplugin5.proto"], &["proto/"])?;
    println!("cargo:rerun-if-changed=proto/tfplugin5.proto");
    Ok(())
}
