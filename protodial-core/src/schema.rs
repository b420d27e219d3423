//! # Schema
//!
//! Everything needed to turn `.proto` sources into something we can query at runtime.
//!
//! * [`SchemaLoader`] resolves a proto file against a list of import paths, compiles it
//!   together with all of its transitive imports and flattens the result into a single
//!   deduplicated `FileDescriptorSet`.
//! * [`Registry`] is the immutable, queryable view over that set. A new one is built on
//!   every load; callers swap it in as a whole.
//!
//! ```rust,no_run
//! use protodial_core::schema::load_registry;
//! use std::path::{Path, PathBuf};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = load_registry(&[PathBuf::from("protos")], Path::new("protos/echo.proto"))?;
//!
//! for service in registry.services() {
//!     println!("{service}: {:?}", registry.methods(&service));
//! }
//! # Ok(())
//! # }
//! ```
mod loader;
mod registry;

pub use loader::{LoadError, SchemaLoader, load_registry};
pub use registry::{LookupError, Registry};
