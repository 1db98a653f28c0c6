use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

const REQUIRED_ASSETS: [&str; 3] = [
    "assets/shaders/vertex_shader.wgsl",
    "assets/shaders/fragment_shader.wgsl",
    "assets/scenes/EmptyScene.txt",
];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    for asset in REQUIRED_ASSETS {
        ensure!(
            manifest_dir.join(asset).exists(),
            "bundled asset {} is missing",
            asset
        );
    }

    // bundle a copy next to the build so the viewer runs from any directory
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[manifest_dir.join("assets")], &out_dir, &copy_options)?;
    println!(
        "cargo:rustc-env=SCENE_NGIN_BUNDLED_ASSETS={}",
        out_dir.join("assets").display()
    );

    Ok(())
}
