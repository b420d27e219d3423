#![allow(dead_code)]

use protodial_core::schema::{Registry, load_registry};
use std::path::{Path, PathBuf};

pub fn protos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/protos")
}

pub fn shapes_registry() -> Registry {
    let dir = protos_dir();
    load_registry(std::slice::from_ref(&dir), &dir.join("shapes.proto"))
        .expect("Failed to load shapes.proto")
}

pub fn order_registry() -> Registry {
    let dir = protos_dir();
    load_registry(std::slice::from_ref(&dir), &dir.join("order.proto"))
        .expect("Failed to load order.proto")
}

pub fn echo_registry() -> Registry {
    let dir = PathBuf::from(echo_service::PROTO_DIR);
    load_registry(std::slice::from_ref(&dir), Path::new("echo.proto"))
        .expect("Failed to load echo.proto")
}
