//! # Protodial Core
//!
//! `protodial-core` is the library powering the Protodial CLI. It lets you explore and call
//! gRPC services described only by their `.proto` sources, with no generated code involved.
//!
//! ## Key Components
//!
//! * **[`schema`]:** Parses `.proto` files and their imports into an immutable
//!   [`Registry`](schema::Registry) that lists services and methods.
//! * **[`introspect`]:** Materializes the field tree (nested messages, enums, oneofs, maps) of
//!   any method's input or output message.
//! * **[`invoker`]:** Sends a unary request built from JSON over a fresh TLS connection and
//!   renders the response as JSON.
//!
//! ## Internal building blocks
//!
//! * **[`GrpcClient`](grpc::client::GrpcClient):** A unary gRPC client over any `tonic`
//!   transport, exchanging `prost_reflect::DynamicMessage` values through a custom codec.
//! * **[`json`]:** The JSON mapping used at the edge of the core.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod grpc;
pub mod introspect;
pub mod invoker;
pub mod json;
pub mod schema;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
