//! Server-side components of the Bookstore service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI and environment configuration.
//! - [`service`] - gRPC handlers for the `Bookstore` service.
//! - [`store`] - the catalog persistence seam and its MongoDB implementation.
//! - [`telemetry`] - structured logging and optional OpenTelemetry export.

pub mod config;
pub mod service;
pub mod store;
pub mod telemetry;
