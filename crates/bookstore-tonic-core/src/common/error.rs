//! Error types for the Bookstore service.
//!
//! This module defines the central `Error` enum for every per-request failure
//! and implements `From<Error>` for `tonic::Status`, which is the single place
//! where failures are classified into gRPC status codes.
//!
//! ## Error Cases
//! - `NotFound`: no document matches the requested book ID.
//! - `Store`: the MongoDB driver failed (network, server, cursor).
//! - `Encode`: a record could not be turned into a document.
//! - `Decode`: a stored document could not be turned into a record.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the Bookstore service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// No document carries the requested ID.
    #[error("Cannot find book with the ID: {id}")]
    NotFound { id: String },

    /// The document store reported a failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Serializing a record into a document failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A stored document does not have the book shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for Error {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for Error {
    fn from(err: mongodb::bson::de::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { id } => {
                Status::not_found(format!("Cannot find book with the ID: {id}"))
            }
            Error::Store(cause) | Error::Encode(cause) => {
                Status::internal(format!("Internal Error: {cause}"))
            }
            Error::Decode(cause) => Status::internal(format!("Cannot decode data: {cause}")),
        }
    }
}
