//! Search, filtering and ordering of the books shown in "my library".

use std::cmp::Ordering;

use crate::api::{Book, LibraryViewParams, SortDirection, SortField};
use crate::reading_status::{StatusMap, NO_STATUS};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryQuery {
    pub search: String,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub rating: Option<String>,
    pub sort: SortField,
    pub direction: SortDirection,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl From<LibraryViewParams> for LibraryQuery {
    fn from(params: LibraryViewParams) -> Self {
        Self {
            search: params.search.unwrap_or_default(),
            genre: non_empty(params.genre),
            status: non_empty(params.status),
            rating: non_empty(params.rating),
            sort: params.sort.unwrap_or_default(),
            direction: params.direction.unwrap_or_default(),
        }
    }
}

/// Integer prefix of `value` the way `parseInt` reads it: leading whitespace, an optional
/// sign and at least one digit. Anything after the digits is ignored.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let number: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -number } else { number })
}

impl LibraryQuery {
    /// Minimal rating requested. A value that does not parse disables the filter.
    fn min_rating(&self) -> Option<i64> {
        let raw = self.rating.as_deref()?;
        let parsed = parse_leading_int(raw);
        if parsed.is_none() {
            tracing::debug!("Ignoring non numeric rating filter {:?}", raw);
        }
        parsed
    }

    fn matches_search(&self, book: &Book) -> bool {
        let term = self.search.trim();
        if term.is_empty() {
            return true;
        }
        let term = term.to_lowercase();
        let details = &book.details;
        details.title.to_lowercase().contains(&term)
            || details.author.to_lowercase().contains(&term)
            || details
                .genre
                .as_ref()
                .is_some_and(|genre| genre.to_lowercase().contains(&term))
    }

    fn matches_genre(&self, book: &Book) -> bool {
        match &self.genre {
            None => true,
            Some(genre) => book.details.genre.as_ref() == Some(genre),
        }
    }

    fn matches_status(&self, book: &Book, statuses: &StatusMap) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(NO_STATUS) => statuses.get(&book.id).is_none(),
            Some(wanted) => statuses
                .get(&book.id)
                .is_some_and(|status| status.as_str() == wanted),
        }
    }

    fn matches_rating(&self, book: &Book, min_rating: Option<i64>) -> bool {
        match min_rating {
            None => true,
            Some(min) => book
                .details
                .rating
                .is_some_and(|rating| i64::from(rating) >= min),
        }
    }

    /// Ascending comparison on the sort field, missing values first, then the direction applied
    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        let (a, b) = (&a.details, &b.details);
        let ordering = match self.sort {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Author => a.author.cmp(&b.author),
            SortField::Year => a.year.cmp(&b.year),
            SortField::Pages => a.pages.cmp(&b.pages),
            SortField::Rating => a.rating.cmp(&b.rating),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Books to display for `query`, in display order. `books` itself is left untouched.
pub fn apply(books: &[Book], query: &LibraryQuery, statuses: &StatusMap) -> Vec<Book> {
    let min_rating = query.min_rating();
    let mut visible: Vec<Book> = books
        .iter()
        .filter(|book| {
            query.matches_search(book)
                && query.matches_genre(book)
                && query.matches_status(book, statuses)
                && query.matches_rating(book, min_rating)
        })
        .cloned()
        .collect();
    // stable, ties keep the order they came in
    visible.sort_by(|a, b| query.compare(a, b));
    visible
}
