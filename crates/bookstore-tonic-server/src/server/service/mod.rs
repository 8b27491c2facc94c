//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`BookService`).

pub mod handler;
