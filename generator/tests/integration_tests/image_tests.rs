//! Checks on the container build.
//!
//! Tests cover:
//! - The image building from the committed lockfile
//! - The builder toolchain matching the workspace's declared minimum Rust version

const DOCKERFILE: &str = include_str!("../../../Dockerfile");
const WORKSPACE_MANIFEST: &str = include_str!("../../../Cargo.toml");

fn manifest_value<'a>(manifest: &'a str, key: &str) -> Option<&'a str> {
    manifest
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().trim_matches('"'))
}

#[test]
fn test_image_builds_from_lockfile() {
    assert!(DOCKERFILE.contains("COPY Cargo.toml Cargo.lock ./"));
    assert!(DOCKERFILE.contains("cargo build --release --locked --bin mock-app"));
}

#[test]
fn test_builder_matches_rust_version() {
    let rust_version = manifest_value(WORKSPACE_MANIFEST, "rust-version").unwrap();
    assert!(DOCKERFILE.contains(&format!("FROM rust:{rust_version}-")));
    assert_eq!(manifest_value(WORKSPACE_MANIFEST, "resolver"), Some("3"));
}
