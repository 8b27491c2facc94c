//! Persistence seam for the Bookstore service.
//!
//! Handlers talk to the catalog only through [`BookStore`]. Each method is a
//! single store round-trip and reports failures as
//! [`bookstore_tonic_core::Error`]; classification into gRPC statuses happens
//! in the handlers.
//!
//! - [`mongo`] - the MongoDB implementation used by the binary.
//! - `memory` - an in-memory implementation used by tests.

#[cfg(test)]
pub mod memory;
pub mod mongo;

use bookstore_tonic_core::{Result, record::BookRecord};

/// Catalog operations backing the five RPCs.
///
/// Implementations must be safe to share between concurrently running
/// handlers.
#[tonic::async_trait]
pub trait BookStore: Send + Sync + 'static {
    /// Inserts `record` as a new document. Duplicate IDs are not rejected.
    async fn insert(&self, record: &BookRecord) -> Result<()>;

    /// Returns the first document whose ID matches, `None` when nothing
    /// matches, or `Error::Decode` when the match is malformed.
    async fn find_by_id(&self, id: &str) -> Result<Option<BookRecord>>;

    /// Replaces all fields of the first document whose ID matches
    /// `record.book_id`. Returns `false` when nothing matched; never inserts.
    async fn replace_by_id(&self, record: &BookRecord) -> Result<bool>;

    /// Deletes the first document whose ID matches and returns the number of
    /// deleted documents.
    async fn delete_by_id(&self, id: &str) -> Result<u64>;

    /// Returns every book. A single undecodable document fails the call.
    async fn list_all(&self) -> Result<Vec<BookRecord>>;

    /// Releases the connection. Called once after the listener stops.
    async fn close(&self);
}
