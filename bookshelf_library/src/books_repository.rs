pub use in_memory_books_repository::InMemoryBookRepository;
pub use postgres_books_repository::PostgresBooksRepository;

use crate::api::{Book, BookDetails, BookDetailsPatch, BookId, ReadingStatus, UserId};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Adds book to the library of the user, returns the stored book with its assigned id
    async fn add_book(
        &self,
        user_id: UserId,
        details: BookDetails,
    ) -> Result<Book, BookRepositoryError>;
    /// Retrieves the book from repository
    async fn get_book(&self, book_id: &str) -> Result<Book, BookRepositoryError>;
    /// Lists books of the user in the order they were added
    async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, BookRepositoryError>;
    /// Updates book in the repository, returns the updated book or None if it was not found
    async fn update_book(
        &self,
        book_id: &str,
        patch: BookDetailsPatch,
    ) -> Result<Option<Book>, BookRepositoryError>;
    /// Removes book from the repository, returns the removed book or None if it was not found
    async fn delete_book(&self, book_id: &str) -> Result<Option<Book>, BookRepositoryError>;
    /// Overwrites the reading status, returns None if the book was not found
    async fn set_status(
        &self,
        book_id: &str,
        status: Option<ReadingStatus>,
    ) -> Result<Option<Book>, BookRepositoryError>;
    /// Removes the genre (compared case-insensitively) from every book, returns the number of books changed
    async fn clear_genre(&self, genre: &str) -> Result<u64, BookRepositoryError>;
}
