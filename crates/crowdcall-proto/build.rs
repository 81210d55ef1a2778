//! Build script for crowdcall-proto
//!
//! Compiles protobuf definitions using tonic-prost-build.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = "../../proto".to_string();

    let protos = [
        "crowdcall/v1/common.proto",
        "crowdcall/v1/prediction.proto",
        "crowdcall/v1/user.proto",
        "crowdcall/v1/leaderboard.proto",
    ];

    let proto_paths: Vec<String> = protos
        .iter()
        .map(|p| format!("{proto_root}/{p}"))
        .collect();

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&proto_paths, &[proto_root])?;

    Ok(())
}
