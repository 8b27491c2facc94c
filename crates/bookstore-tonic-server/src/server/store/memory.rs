//! In-memory [`BookStore`] for tests.
//!
//! Documents are kept in insertion order and go through the same
//! [`BookRecord`] document mapping as the MongoDB store, so malformed
//! documents can be planted with [`MemoryStore::insert_raw`].

use super::BookStore;
use bookstore_tonic_core::{
    Error, Result,
    bson::Document,
    record::{BookRecord, ID_KEY},
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<Vec<Document>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` as-is, bypassing the record mapping.
    pub fn insert_raw(&self, document: Document) {
        self.documents.lock().push(document);
    }

    /// Makes every following call fail with `Error::Store(cause)`.
    pub fn fail_with(&self, cause: &str) {
        *self.failure.lock() = Some(cause.to_string());
    }

    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    fn check(&self) -> Result<()> {
        match self.failure.lock().as_ref() {
            Some(cause) => Err(Error::Store(cause.clone())),
            None => Ok(()),
        }
    }
}

fn matches(document: &Document, id: &str) -> bool {
    document.get_str(ID_KEY).is_ok_and(|value| value == id)
}

#[tonic::async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, record: &BookRecord) -> Result<()> {
        self.check()?;
        let document = record.to_document()?;
        self.documents.lock().push(document);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BookRecord>> {
        self.check()?;
        let found = self
            .documents
            .lock()
            .iter()
            .find(|document| matches(document, id))
            .cloned();
        found.map(BookRecord::from_document).transpose()
    }

    async fn replace_by_id(&self, record: &BookRecord) -> Result<bool> {
        self.check()?;
        let replacement = record.to_document()?;
        let mut documents = self.documents.lock();
        match documents
            .iter_mut()
            .find(|document| matches(document, &record.book_id))
        {
            Some(document) => {
                for (key, value) in replacement {
                    document.insert(key, value);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64> {
        self.check()?;
        let mut documents = self.documents.lock();
        match documents.iter().position(|document| matches(document, id)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list_all(&self) -> Result<Vec<BookRecord>> {
        self.check()?;
        let documents = self.documents.lock().clone();
        documents
            .into_iter()
            .map(BookRecord::from_document)
            .collect()
    }

    async fn close(&self) {}
}
