//! MongoDB-backed [`BookStore`].
//!
//! The collection is opened untyped (`Collection<Document>`) so that decoding
//! goes through [`BookRecord::from_document`] and a malformed document is
//! reported as `Error::Decode` rather than as a driver error.

use super::BookStore;
use crate::server::config::ServerConfig;
use anyhow::Context;
use bookstore_tonic_core::{
    Result,
    bson::{Document, doc},
    record::{BookRecord, id_filter},
};
use futures::TryStreamExt;
use mongodb::{Client, Collection, options::ClientOptions};

/// Shared handle to the `books` collection.
///
/// Cloning is cheap: the driver keeps its connection pool behind an `Arc`.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    books: Collection<Document>,
}

impl MongoStore {
    /// Dials MongoDB and verifies the deployment answers a `ping`.
    ///
    /// Both the dial and the ping are bounded by `config.connect_timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the URI is invalid, the server cannot be selected in time, or
    /// the ping is rejected.
    pub async fn connect(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = Self::open(config).await?;

        tokio::time::timeout(
            config.connect_timeout,
            store
                .client
                .database(&config.mongo_database)
                .run_command(doc! { "ping": 1 }),
        )
        .await
        .context("timed out pinging MongoDB")?
        .context("could not connect to MongoDB")?;

        tracing::info!(
            database = %config.mongo_database,
            collection = %config.mongo_collection,
            "Connected to MongoDB"
        );
        Ok(store)
    }

    /// Builds the client and collection handles without contacting the
    /// server. The driver dials lazily on the first operation.
    async fn open(config: &ServerConfig) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(&config.mongo_uri)
            .await
            .context("invalid MongoDB connection string")?;
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).context("failed to start MongoDB client")?;
        let books = client
            .database(&config.mongo_database)
            .collection::<Document>(&config.mongo_collection);
        Ok(Self { client, books })
    }
}

#[tonic::async_trait]
impl BookStore for MongoStore {
    async fn insert(&self, record: &BookRecord) -> Result<()> {
        let result = self.books.insert_one(record.to_document()?).await?;
        tracing::debug!(inserted_id = %result.inserted_id, "Inserted book document");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BookRecord>> {
        match self.books.find_one(id_filter(id)).await? {
            Some(document) => BookRecord::from_document(document).map(Some),
            None => Ok(None),
        }
    }

    async fn replace_by_id(&self, record: &BookRecord) -> Result<bool> {
        let previous = self
            .books
            .find_one_and_update(id_filter(&record.book_id), record.to_update()?)
            .await?;
        Ok(previous.is_some())
    }

    async fn delete_by_id(&self, id: &str) -> Result<u64> {
        let result = self.books.delete_one(id_filter(id)).await?;
        Ok(result.deleted_count)
    }

    async fn list_all(&self) -> Result<Vec<BookRecord>> {
        let mut cursor = self.books.find(doc! {}).await?;
        let mut records = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            records.push(BookRecord::from_document(document)?);
        }
        Ok(records)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
