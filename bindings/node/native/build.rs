/*
Purpose: Link the Node binding against librawprint.
Exports: None (build script only).
Role: Resolve the librawprint search path for the N-API addon.
Invariants: Uses RAWPRINT_LIB_DIR or repo-local target/ outputs.
Notes: Fails fast when librawprint cannot be located.
*/

use std::env;
use std::path::PathBuf;

fn main() {
    napi_build::setup();
    println!("cargo:rerun-if-env-changed=RAWPRINT_LIB_DIR");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let repo_root = crate_dir
        .ancestors()
        .nth(3)
        .expect("bindings/node/native should be three levels below repo root")
        .to_path_buf();

    let lib_dir = env::var("RAWPRINT_LIB_DIR")
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain([
            repo_root.join("target").join("release"),
            repo_root.join("target").join("debug"),
        ])
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| {
            panic!("librawprint not found; set RAWPRINT_LIB_DIR or build target/*/librawprint.*")
        });

    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=rawprint");
}
