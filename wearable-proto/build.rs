//! Build script for generating wearable protocol buffer code.

use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Proto files live at the workspace root
    let proto_root = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?)
        .parent()
        .ok_or("wearable-proto must live inside the workspace")?
        .join("proto");

    let protos = [
        proto_root.join("wearable/v1/wearable.proto"),
        proto_root.join("push_sender/v1/push_sender.proto"),
    ];

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(PathBuf::from(env::var("OUT_DIR")?).join("wearable_descriptor.bin"))
        // Suppress specific clippy warnings for generated code
        .type_attribute(
            ".",
            "#[allow(clippy::all, clippy::pedantic, clippy::nursery)]",
        )
        .server_attribute(
            ".",
            "#[allow(clippy::all, clippy::pedantic, clippy::nursery)]",
        )
        .client_attribute(
            ".",
            "#[allow(clippy::all, clippy::pedantic, clippy::nursery)]",
        )
        .compile_protos(&protos, &[proto_root])?;

    Ok(())
}
