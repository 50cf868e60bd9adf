use std::fmt;

use serde::{Deserialize, Serialize};

use super::store::BookError;

/// A stored catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// 16-character URL-safe identifier, assigned at creation
    pub id: String,
    pub name: String,
    pub year: Option<i32>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub page_count: u32,
    pub read_page: u32,
    /// Always `read_page == page_count` as of the last write
    pub finished: bool,
    pub reading: bool,
    /// ISO-8601 UTC, millisecond precision
    pub inserted_at: String,
    pub updated_at: String,
}

impl Book {
    /// Overwrite every caller-owned field; `id` and `inserted_at` are kept.
    pub(crate) fn apply(&mut self, name: String, payload: BookPayload, updated_at: String) {
        self.name = name;
        self.year = payload.year;
        self.author = payload.author;
        self.summary = payload.summary;
        self.publisher = payload.publisher;
        self.page_count = payload.page_count;
        self.read_page = payload.read_page;
        self.reading = payload.reading;
        self.finished = payload.page_count == payload.read_page;
        self.updated_at = updated_at;
    }
}

/// Request body accepted by create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub read_page: u32,
    #[serde(default)]
    pub reading: bool,
}

/// Which write a payload is validated for; picks the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Add,
    Update,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAction::Add => f.write_str("add"),
            WriteAction::Update => f.write_str("update"),
        }
    }
}

impl BookPayload {
    /// Check the write rules and hand back the validated name.
    pub fn validate(&self, action: WriteAction) -> Result<&str, BookError> {
        let name = match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(BookError::InvalidInput(format!(
                    "cannot {} book: name is required",
                    action
                )))
            }
        };

        if self.read_page > self.page_count {
            return Err(BookError::InvalidInput(format!(
                "cannot {} book: readPage must not exceed pageCount",
                action
            )));
        }

        Ok(name)
    }
}

/// `{id, name, publisher}` projection returned by the list operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    pub publisher: Option<String>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}

/// Conjunctive list filter; `None` leaves that attribute unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring of `name`
    pub name: Option<String>,
    pub reading: Option<bool>,
    pub finished: Option<bool>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(ref needle) = self.name {
            if !book.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if self.reading.is_some_and(|reading| book.reading != reading) {
            return false;
        }
        if self.finished.is_some_and(|finished| book.finished != finished) {
            return false;
        }
        true
    }
}

/// Raw `GET /books` query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub name: Option<String>,
    pub reading: Option<String>,
    pub finished: Option<String>,
}

/// First occurrence of a repeated key wins; unknown keys are ignored.
impl FromIterator<(String, String)> for ListQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut query.name,
                "reading" => &mut query.reading,
                "finished" => &mut query.finished,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

impl From<ListQuery> for BookFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            name: query.name,
            reading: query.reading.as_deref().map(flag),
            finished: query.finished.as_deref().map(flag),
        }
    }
}

/// `"1"` is true; every other value is false.
fn flag(value: &str) -> bool {
    value == "1"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBook {
    pub book_id: String,
}

#[derive(Debug, Serialize)]
pub struct BookList {
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub book: Book,
}
