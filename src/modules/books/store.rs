//! In-memory catalog. One lock guards the whole collection so every
//! lookup-validate-mutate sequence is serialized.

use rand::Rng;
use thiserror::Error;
use time::{
    format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime, UtcOffset,
};
use tokio::sync::RwLock;

use super::models::{Book, BookFilter, BookPayload, BookSummary, WriteAction};

pub const ID_LENGTH: usize = 16;

const ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

const ISO_MILLIS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// Catalog operation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("failed to format timestamp: {0}")]
    Timestamp(String),
}

type Clock = Box<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Ordered, process-local book collection
pub struct BookStore {
    books: RwLock<Vec<Book>>,
    clock: Clock,
}

impl BookStore {
    pub fn new() -> Self {
        Self::with_clock(OffsetDateTime::now_utc)
    }

    /// Store whose timestamps come from `clock` instead of the system time
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> OffsetDateTime + Send + Sync + 'static,
    {
        Self {
            books: RwLock::new(Vec::new()),
            clock: Box::new(clock),
        }
    }

    fn timestamp(&self) -> Result<String, BookError> {
        (self.clock)()
            .to_offset(UtcOffset::UTC)
            .format(ISO_MILLIS)
            .map_err(|e| BookError::Timestamp(e.to_string()))
    }

    /// Append a new record and return its id
    pub async fn create(&self, payload: BookPayload) -> Result<String, BookError> {
        let mut books = self.books.write().await;

        let name = match payload.validate(WriteAction::Add) {
            Ok(name) => name.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "create rejected");
                return Err(e);
            }
        };

        let now = self.timestamp()?;
        let book = Book {
            id: generate_id(),
            name,
            year: payload.year,
            author: payload.author,
            summary: payload.summary,
            publisher: payload.publisher,
            page_count: payload.page_count,
            read_page: payload.read_page,
            finished: payload.page_count == payload.read_page,
            reading: payload.reading,
            inserted_at: now.clone(),
            updated_at: now,
        };

        let id = book.id.clone();
        books.push(book);

        tracing::info!(book_id = %id, total = books.len(), "book added");
        Ok(id)
    }

    /// Projections of every record the filter keeps, in collection order
    pub async fn list(&self, filter: &BookFilter) -> Vec<BookSummary> {
        let books = self.books.read().await;
        books
            .iter()
            .filter(|book| filter.matches(book))
            .map(BookSummary::from)
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<Book, BookError> {
        let books = self.books.read().await;
        books.iter().find(|book| book.id == id).cloned().ok_or_else(|| {
            tracing::debug!(book_id = %id, "book lookup missed");
            BookError::NotFound("book not found".to_string())
        })
    }

    /// Replace every mutable field of the record; the id check runs before validation
    pub async fn update(&self, id: &str, payload: BookPayload) -> Result<(), BookError> {
        let mut books = self.books.write().await;

        let Some(book) = books.iter_mut().find(|book| book.id == id) else {
            tracing::debug!(book_id = %id, "update target missing");
            return Err(BookError::NotFound(
                "cannot update book: id not found".to_string(),
            ));
        };

        let name = match payload.validate(WriteAction::Update) {
            Ok(name) => name.to_string(),
            Err(e) => {
                tracing::debug!(book_id = %id, error = %e, "update rejected");
                return Err(e);
            }
        };

        let now = self.timestamp()?;
        book.apply(name, payload, now);

        tracing::info!(book_id = %id, "book updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), BookError> {
        let mut books = self.books.write().await;

        let Some(index) = books.iter().position(|book| book.id == id) else {
            tracing::debug!(book_id = %id, "delete target missing");
            return Err(BookError::NotFound(
                "cannot delete book: id not found".to_string(),
            ));
        };

        books.remove(index);

        tracing::info!(book_id = %id, total = books.len(), "book deleted");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Random URL-safe token; uniqueness is probabilistic and not re-checked.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
