pub use in_memory_genres_repository::InMemoryGenresRepository;
pub use postgres_genres_repository::PostgresGenresRepository;

use crate::api::Genre;

mod in_memory_genres_repository;
mod postgres_genres_repository;

#[derive(thiserror::Error, Debug)]
pub enum GenresRepositoryError {
    #[error("Genre {0} already exists")]
    AlreadyExists(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait GenresRepository: Send + Sync {
    /// Registers a genre, names are unique regardless of case
    async fn add_genre(&self, name: &str) -> Result<Genre, GenresRepositoryError>;
    /// Looks up the genre matching `name` case-insensitively
    async fn find_genre(&self, name: &str) -> Result<Option<Genre>, GenresRepositoryError>;
    /// Lists all genres sorted by name
    async fn list_genres(&self) -> Result<Vec<Genre>, GenresRepositoryError>;
    /// Removes the genre matching `name` case-insensitively, returns None if there was none
    async fn delete_genre(&self, name: &str) -> Result<Option<Genre>, GenresRepositoryError>;
}

/// Registers `name` unless a genre with that name is already known, returns the stored genre
/// so books always carry the registered spelling
pub async fn ensure_genre(
    repository: &dyn GenresRepository,
    name: &str,
) -> Result<Genre, GenresRepositoryError> {
    match repository.add_genre(name).await {
        Ok(genre) => {
            tracing::info!("Registered genre {}", genre.name);
            Ok(genre)
        }
        Err(GenresRepositoryError::AlreadyExists(_)) => repository
            .find_genre(name)
            .await?
            .ok_or_else(|| GenresRepositoryError::Other(format!("Genre {} vanished", name))),
        Err(err) => Err(err),
    }
}
