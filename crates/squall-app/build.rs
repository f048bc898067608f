use std::{error::Error, path::PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    let protoc_path =
        protoc_bin_vendored::protoc_bin_path().expect("failed to get vendored protoc binary");
    let well_known =
        protoc_bin_vendored::include_path().expect("failed to get vendored protoc includes");
    unsafe {
        std::env::set_var("PROTOC", &protoc_path);
    }

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(
            &["proto/squall/app/v1/app.proto"],
            &[PathBuf::from("proto"), well_known],
        )?;

    println!("cargo:rerun-if-changed=proto");
    Ok(())
}
