//! gRPC service implementation for the book catalog.
//!
//! This module defines [`BookService`], the concrete implementation of the
//! [`Bookstore`] gRPC service defined in `proto/bookstore.proto`. Every RPC
//! performs exactly one [`BookStore`] call and translates its outcome:
//!
//! | RPC           | store call        | empty result          |
//! |---------------|-------------------|-----------------------|
//! | `PostBook`    | `insert`          | -                     |
//! | `GetBook`     | `find_by_id`      | `NOT_FOUND`           |
//! | `UpdateBook`  | `replace_by_id`   | `NOT_FOUND`           |
//! | `DeleteBook`  | `delete_by_id`    | `deleted = 0`         |
//! | `GetAllBooks` | `list_all`        | empty list            |
//!
//! A malformed document found by `GetBook` is reported as `NOT_FOUND`; the
//! same document makes `GetAllBooks` fail with `INTERNAL`. A request without a
//! `book` is handled as a book whose fields are all empty.
//!
//! Handlers hold no state besides the store handle. When a client cancels, tonic
//! drops the handler future and with it the in-flight store operation.

use crate::server::{
    store::BookStore,
    telemetry::{increment_errors, increment_requests, record_request_duration},
};
use bookstore_tonic_core::{
    Error, Result,
    proto::{
        Book, BookRequest, BookResponse, DeleteBookRes, GetAllReq, GetAllResponse, GetBookReq,
        bookstore_server::Bookstore,
    },
    record::BookRecord,
};
use std::sync::Arc;
use std::time::Instant;
use tonic::{Code, Request, Response, Status};

/// gRPC front of the catalog, generic over its store so tests can inject an
/// in-memory one.
pub struct BookService<S> {
    store: Arc<S>,
}

impl<S> Clone for BookService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BookStore> BookService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Releases the store. Called once the listener has stopped.
    pub async fn shutdown(&self) {
        self.store.close().await;
    }

    async fn create(&self, record: BookRecord) -> Result<BookRecord> {
        self.store.insert(&record).await?;
        tracing::info!("Inserted new book");
        Ok(record)
    }

    async fn fetch(&self, id: &str) -> Result<BookRecord> {
        match self.store.find_by_id(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(Error::not_found(id)),
            Err(Error::Decode(cause)) => {
                tracing::warn!(%cause, "Stored book could not be decoded");
                Err(Error::not_found(id))
            }
            Err(err) => Err(err),
        }
    }

    async fn replace(&self, record: BookRecord) -> Result<BookRecord> {
        if self.store.replace_by_id(&record).await? {
            tracing::info!("Updated book");
            Ok(record)
        } else {
            Err(Error::not_found(record.book_id))
        }
    }

    async fn remove(&self, id: &str) -> Result<i64> {
        let deleted = self.store.delete_by_id(id).await?;
        tracing::info!(deleted, "Deleted book");
        Ok(i64::try_from(deleted).unwrap_or(i64::MAX))
    }

    async fn list(&self) -> Result<Vec<BookRecord>> {
        let records = self.store.list_all().await?;
        tracing::info!(count = records.len(), "Listed books");
        Ok(records)
    }
}

fn book_request(req: Request<BookRequest>) -> BookRecord {
    BookRecord::from(req.into_inner().book.unwrap_or_default())
}

fn book_response(record: BookRecord) -> BookResponse {
    BookResponse {
        book: Some(Book::from(record)),
    }
}

/// Records duration and error metrics and converts the outcome into a tonic
/// response.
fn respond<T>(
    rpc: &'static str,
    start: Instant,
    result: Result<T>,
) -> core::result::Result<Response<T>, Status> {
    record_request_duration(rpc, start.elapsed().as_secs_f64() * 1000.0);
    result.map(Response::new).map_err(|err| {
        let status = Status::from(err);
        increment_errors(rpc, status.code());
        if status.code() == Code::NotFound {
            tracing::info!(rpc, message = status.message(), "Book not found");
        } else {
            tracing::error!(rpc, code = ?status.code(), message = status.message(), "Request failed");
        }
        status
    })
}

#[tonic::async_trait]
impl<S: BookStore> Bookstore for BookService<S> {
    #[tracing::instrument(skip_all, fields(book_id = tracing::field::Empty))]
    async fn post_book(
        &self,
        req: Request<BookRequest>,
    ) -> core::result::Result<Response<BookResponse>, Status> {
        let start = Instant::now();
        increment_requests("PostBook");
        let record = book_request(req);
        tracing::Span::current().record("book_id", record.book_id.as_str());

        let result = self.create(record).await.map(book_response);
        respond("PostBook", start, result)
    }

    #[tracing::instrument(skip_all, fields(book_id = %req.get_ref().id))]
    async fn get_book(
        &self,
        req: Request<GetBookReq>,
    ) -> core::result::Result<Response<BookResponse>, Status> {
        let start = Instant::now();
        increment_requests("GetBook");
        let id = req.into_inner().id;

        let result = self.fetch(&id).await.map(book_response);
        respond("GetBook", start, result)
    }

    #[tracing::instrument(skip_all, fields(book_id = tracing::field::Empty))]
    async fn update_book(
        &self,
        req: Request<BookRequest>,
    ) -> core::result::Result<Response<BookResponse>, Status> {
        let start = Instant::now();
        increment_requests("UpdateBook");
        let record = book_request(req);
        tracing::Span::current().record("book_id", record.book_id.as_str());

        let result = self.replace(record).await.map(book_response);
        respond("UpdateBook", start, result)
    }

    #[tracing::instrument(skip_all, fields(book_id = %req.get_ref().id))]
    async fn delete_book(
        &self,
        req: Request<GetBookReq>,
    ) -> core::result::Result<Response<DeleteBookRes>, Status> {
        let start = Instant::now();
        increment_requests("DeleteBook");
        let id = req.into_inner().id;

        let result = self
            .remove(&id)
            .await
            .map(|deleted| DeleteBookRes { deleted });
        respond("DeleteBook", start, result)
    }

    #[tracing::instrument(skip_all)]
    async fn get_all_books(
        &self,
        _req: Request<GetAllReq>,
    ) -> core::result::Result<Response<GetAllResponse>, Status> {
        let start = Instant::now();
        increment_requests("GetAllBooks");

        let result = self.list().await.map(|records| GetAllResponse {
            book: records.into_iter().map(Book::from).collect(),
        });
        respond("GetAllBooks", start, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::memory::MemoryStore;
    use bookstore_tonic_core::bson::doc;

    fn book(id: &str, name: &str) -> Book {
        Book {
            book_id: id.to_string(),
            book_name: name.to_string(),
            category: "fiction".to_string(),
            author: "Anonymous".to_string(),
        }
    }

    fn service() -> (BookService<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        (BookService::new(store.clone()), store)
    }

    async fn post(service: &BookService<MemoryStore>, book: Book) -> Book {
        let req = Request::new(BookRequest { book: Some(book) });
        service.post_book(req).await.unwrap().into_inner().book.unwrap()
    }

    async fn get(service: &BookService<MemoryStore>, id: &str) -> core::result::Result<Book, Status> {
        let req = Request::new(GetBookReq { id: id.to_string() });
        service
            .get_book(req)
            .await
            .map(|res| res.into_inner().book.unwrap())
    }

    async fn delete(service: &BookService<MemoryStore>, id: &str) -> i64 {
        let req = Request::new(GetBookReq { id: id.to_string() });
        service.delete_book(req).await.unwrap().into_inner().deleted
    }

    async fn list(service: &BookService<MemoryStore>) -> core::result::Result<Vec<Book>, Status> {
        service
            .get_all_books(Request::new(GetAllReq {}))
            .await
            .map(|res| res.into_inner().book)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (service, _) = service();
        let created = post(&service, book("b1", "Dune")).await;
        assert_eq!(created, book("b1", "Dune"));
        assert_eq!(get(&service, "b1").await.unwrap(), book("b1", "Dune"));
    }

    #[tokio::test]
    async fn create_without_book_stores_empty_fields() {
        let (service, store) = service();
        let res = service
            .post_book(Request::new(BookRequest { book: None }))
            .await
            .unwrap();
        assert_eq!(res.into_inner().book.unwrap(), Book::default());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_are_accepted() {
        let (service, store) = service();
        post(&service, book("b1", "first")).await;
        post(&service, book("b1", "second")).await;
        assert_eq!(store.len(), 2);
        assert_eq!(get(&service, "b1").await.unwrap().book_name, "first");
    }

    #[tokio::test]
    async fn get_of_missing_id_is_not_found() {
        let (service, _) = service();
        let status = get(&service, "nope").await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert!(status.message().contains("nope"));
    }

    #[tokio::test]
    async fn get_of_malformed_document_is_not_found() {
        let (service, store) = service();
        store.insert_raw(doc! { "bookid": "bad", "bookname": 7_i32 });
        let status = get(&service, "bad").await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn delete_reports_count_and_removes() {
        let (service, _) = service();
        post(&service, book("b1", "Dune")).await;
        assert_eq!(delete(&service, "b1").await, 1);
        assert_eq!(get(&service, "b1").await.unwrap_err().code(), Code::NotFound);
        assert_eq!(delete(&service, "b1").await, 0);
    }

    #[tokio::test]
    async fn update_replaces_every_field() {
        let (service, _) = service();
        post(&service, book("b1", "Dune")).await;

        let replacement = Book {
            book_id: "b1".to_string(),
            book_name: "Dune Messiah".to_string(),
            category: "sci-fi".to_string(),
            author: "Frank Herbert".to_string(),
        };
        let res = service
            .update_book(Request::new(BookRequest {
                book: Some(replacement.clone()),
            }))
            .await
            .unwrap();
        assert_eq!(res.into_inner().book.unwrap(), replacement);
        assert_eq!(get(&service, "b1").await.unwrap(), replacement);
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found_and_does_not_insert() {
        let (service, store) = service();
        let status = service
            .update_book(Request::new(BookRequest {
                book: Some(book("ghost", "Nothing")),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn list_returns_every_book() {
        let (service, _) = service();
        assert!(list(&service).await.unwrap().is_empty());

        for id in ["a", "b", "c"] {
            post(&service, book(id, id)).await;
        }
        let mut ids: Vec<String> = list(&service)
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.book_id)
            .collect();
        ids.sort();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn list_fails_whole_on_malformed_document() {
        let (service, store) = service();
        post(&service, book("good", "ok")).await;
        store.insert_raw(doc! { "bookid": "bad", "author": false });
        let status = list(&service).await.unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().starts_with("Cannot decode data"));
    }

    #[tokio::test]
    async fn store_failures_are_internal_per_request() {
        let (service, store) = service();
        post(&service, book("b1", "Dune")).await;
        store.fail_with("connection reset");

        let status = service
            .delete_book(Request::new(GetBookReq {
                id: "b1".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "Internal Error: connection reset");

        let status = get(&service, "b1").await.unwrap_err();
        assert_eq!(status.code(), Code::Internal);

        let status = service
            .update_book(Request::new(BookRequest {
                book: Some(book("b1", "x")),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Internal);
    }
}
