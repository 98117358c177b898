//! Build script for the storefront crate.
//!
//! Computes a content hash over the static assets so templates can append a
//! `?v=` cache buster that changes whenever CSS or JS changes.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets included in the version hash, relative to the crate root.
const HASHED_ASSETS: &[&str] = &["static/css/main.css", "static/js/app.js"];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");

    let mut hasher = Sha256::new();
    for asset in HASHED_ASSETS {
        let path = Path::new(&manifest_dir).join(asset);
        println!("cargo:rerun-if-changed={}", path.display());

        match fs::read(&path) {
            Ok(content) => hasher.update(&content),
            Err(e) => println!("cargo:warning=Could not read {asset}: {e}"),
        }
    }

    let hash = format!("{:x}", hasher.finalize());
    let short_hash = hash.get(..10).unwrap_or(&hash);

    println!("cargo:rustc-env=ASSET_VERSION={short_hash}");
}
