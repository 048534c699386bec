use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::Genre;
use crate::genres_repository::{GenresRepository, GenresRepositoryError};

#[derive(Default)]
pub struct InMemoryGenresRepository {
    genre_sequence_generator: AtomicI32,
    genres: parking_lot::RwLock<Vec<Genre>>,
}

fn same_name(genre: &Genre, name: &str) -> bool {
    genre.name.to_lowercase() == name.to_lowercase()
}

#[async_trait::async_trait]
impl GenresRepository for InMemoryGenresRepository {
    async fn add_genre(&self, name: &str) -> Result<Genre, GenresRepositoryError> {
        let mut genres = self.genres.write();
        if genres.iter().any(|genre| same_name(genre, name)) {
            return Err(GenresRepositoryError::AlreadyExists(name.to_string()));
        }
        let genre = Genre {
            id: self.genre_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1,
            name: name.to_string(),
        };
        genres.push(genre.clone());
        Ok(genre)
    }

    async fn find_genre(&self, name: &str) -> Result<Option<Genre>, GenresRepositoryError> {
        Ok(self
            .genres
            .read()
            .iter()
            .find(|genre| same_name(genre, name))
            .cloned())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, GenresRepositoryError> {
        let mut genres = self.genres.read().clone();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn delete_genre(&self, name: &str) -> Result<Option<Genre>, GenresRepositoryError> {
        let mut genres = self.genres.write();
        let index = genres.iter().position(|genre| same_name(genre, name));
        Ok(index.map(|index| genres.remove(index)))
    }
}
