use std::error::Error;
use std::path::PathBuf;

const PROTO_DIR: &str = "proto";

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    let mut protos = Vec::new();
    for entry in std::fs::read_dir(PROTO_DIR)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "proto") {
            protos.push(path);
        }
    }
    protos.sort();

    println!("cargo:rerun-if-changed={PROTO_DIR}");

    // Server side only, tests drive it through the dynamic client.
    tonic_prost_build::configure()
        .file_descriptor_set_path(out_dir.join("descriptors.bin"))
        .build_client(false)
        .compile_protos(&protos, &[PathBuf::from(PROTO_DIR)])?;

    Ok(())
}
