use std::collections::{HashMap, HashSet};

use crate::api::{Book, BookId, ReadingStatus, StatusCounts};

/// Label used by the library filter for books without any status
pub const NO_STATUS: &str = "sem status";

/// Status a book ends up with when `requested` is chosen while it has `current`.
/// Choosing the active status again clears it.
pub fn next_status(
    current: Option<ReadingStatus>,
    requested: Option<ReadingStatus>,
) -> Option<ReadingStatus> {
    match requested {
        Some(requested) if current == Some(requested) => None,
        requested => requested,
    }
}

/// Mapping of book id to its reading status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMap {
    statuses: HashMap<BookId, ReadingStatus>,
}

impl StatusMap {
    pub fn from_books(books: &[Book]) -> Self {
        Self {
            statuses: books
                .iter()
                .filter_map(|book| book.details.status.map(|status| (book.id.clone(), status)))
                .collect(),
        }
    }

    /// Reads a serialized map, `{"<book id>": "lido" | "lendo" | "quero ler" | null}`.
    /// Anything that is not such an object results in an empty map.
    pub fn load(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(err) => {
                tracing::warn!("Ignoring malformed status map: {}", err);
                Self::default()
            }
        }
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        let Some(entries) = value.as_object() else {
            tracing::warn!("Ignoring status map that is not an object");
            return Self::default();
        };

        Self {
            statuses: entries
                .iter()
                .filter_map(|(book_id, status)| {
                    let status = ReadingStatus::parse(status.as_str()?)?;
                    Some((book_id.clone(), status))
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.statuses)
    }

    pub fn get(&self, book_id: &str) -> Option<ReadingStatus> {
        self.statuses.get(book_id).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BookId, &ReadingStatus)> {
        self.statuses.iter()
    }

    /// Applies the toggle rule of [`next_status`] and returns the resulting status
    pub fn set_status(
        &mut self,
        book_id: &str,
        requested: Option<ReadingStatus>,
    ) -> Option<ReadingStatus> {
        match next_status(self.get(book_id), requested) {
            Some(status) => {
                self.statuses.insert(book_id.to_string(), status);
                Some(status)
            }
            None => {
                self.statuses.remove(book_id);
                None
            }
        }
    }

    /// Drops entries of books that no longer exist, returns how many were dropped
    pub fn retain_books<'a>(&mut self, existing: impl IntoIterator<Item = &'a BookId>) -> usize {
        let existing: HashSet<&BookId> = existing.into_iter().collect();
        let before = self.statuses.len();
        self.statuses
            .retain(|book_id, _| existing.contains(book_id));
        before - self.statuses.len()
    }

    pub fn counts(&self, books: &[Book]) -> StatusCounts {
        books.iter().fold(
            StatusCounts {
                total: books.len(),
                ..StatusCounts::default()
            },
            |mut counts, book| {
                match self.get(&book.id) {
                    Some(ReadingStatus::Read) => counts.lido += 1,
                    Some(ReadingStatus::Reading) => counts.lendo += 1,
                    Some(ReadingStatus::WantToRead) => counts.quero_ler += 1,
                    None => {}
                }
                counts
            },
        )
    }
}
