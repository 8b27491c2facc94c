//! gRPC service and message definitions generated from
//! `proto/bookstore.proto`.
//!
//! ## Service
//!
//! - `Bookstore` - `PostBook`, `GetBook`, `UpdateBook`, `DeleteBook` and
//!   `GetAllBooks`. Server side lives in [`bookstore_server`], the generated
//!   client in [`bookstore_client`].
//!
//! ## Messages
//!
//! - [`Book`] - the wire representation of a book: `book_id`, `book_name`,
//!   `category`, `author`.
//! - [`BookRequest`] / [`BookResponse`] - a single optional [`Book`].
//! - [`GetBookReq`] - the ID to look up or delete.
//! - [`DeleteBookRes`] - number of deleted documents.
//! - [`GetAllReq`] / [`GetAllResponse`] - full catalog listing.

tonic::include_proto!("bookstore");

/// Encoded `FileDescriptorSet` for gRPC reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("bookstore_descriptor");
