use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // The linker script only matters for the firmware image; host builds
    // (unit tests) link normally.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("arm") {
        let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
        fs::copy("link.x", out_dir.join("link.x")).unwrap();
        println!("cargo:rustc-link-search={}", out_dir.display());
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
    }
    println!("cargo:rerun-if-changed=link.x");
    println!("cargo:rerun-if-changed=build.rs");
}
