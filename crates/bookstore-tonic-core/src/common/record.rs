//! # Book Records
//!
//! [`BookRecord`] is the in-service representation of a book. It sits between
//! the wire [`Book`] generated from the protobuf schema and the MongoDB
//! [`Document`] stored in the `books` collection.
//!
//! The wire schema spells the ID `bookID` while documents use the lowercase
//! `bookid`. Every key name used against the store lives in this module, so
//! the handlers and the store never spell one out themselves.

use crate::Result;
use crate::proto::Book;
use mongodb::bson::{self, Document, doc};
use serde::{Deserialize, Serialize};

/// Database holding the catalog.
pub const DATABASE_NAME: &str = "Bookstore";

/// Collection holding one document per book.
pub const COLLECTION_NAME: &str = "books";

/// Document key of the book ID.
pub const ID_KEY: &str = "bookid";

/// A book as it is persisted.
///
/// Missing keys decode as empty strings. Unknown keys such as the store
/// assigned `_id` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookRecord {
    #[serde(rename = "bookid")]
    pub book_id: String,
    #[serde(rename = "bookname")]
    pub book_name: String,
    #[serde(rename = "category")]
    pub category: String,
    #[serde(rename = "author")]
    pub author: String,
}

impl BookRecord {
    /// Serializes the record using the store's key names.
    pub fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(self)?)
    }

    /// Deserializes a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) when a known key holds
    /// a non-string value.
    pub fn from_document(document: Document) -> Result<Self> {
        Ok(bson::from_document(document)?)
    }

    /// `$set` modification replacing all four fields of the matched document.
    pub fn to_update(&self) -> Result<Document> {
        Ok(doc! { "$set": self.to_document()? })
    }
}

/// Exact-match filter on the book ID.
pub fn id_filter(id: &str) -> Document {
    doc! { ID_KEY: id }
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id,
            book_name: book.book_name,
            category: book.category,
            author: book.author,
        }
    }
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self {
            book_id: record.book_id,
            book_name: record.book_name,
            category: record.category,
            author: record.author,
        }
    }
}
