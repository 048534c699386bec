use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;

use crate::api::{Book, BookDetails, BookDetailsPatch, BookId, ReadingStatus, UserId};
use crate::books_repository::{BookRepository, BookRepositoryError};

#[derive(Default)]
struct Shelf {
    /// slot -> book, slots only grow so iteration follows insertion order
    books: BTreeMap<u64, Book>,
    slots: HashMap<BookId, u64>,
}

impl Shelf {
    fn get_mut(&mut self, book_id: &str) -> Option<&mut Book> {
        let slot = self.slots.get(book_id)?;
        self.books.get_mut(slot)
    }
}

#[derive(Default)]
pub struct InMemoryBookRepository {
    book_sequence_generator: AtomicU64,
    shelf: parking_lot::RwLock<Shelf>,
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn add_book(
        &self,
        user_id: UserId,
        details: BookDetails,
    ) -> Result<Book, BookRepositoryError> {
        let slot = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        let book = Book {
            id: format!("{}_{}", user_id, slot),
            user_id,
            details,
        };
        let mut shelf = self.shelf.write();
        shelf.slots.insert(book.id.clone(), slot);
        shelf.books.insert(slot, book.clone());
        Ok(book)
    }

    async fn get_book(&self, book_id: &str) -> Result<Book, BookRepositoryError> {
        let shelf = self.shelf.read();
        shelf
            .slots
            .get(book_id)
            .and_then(|slot| shelf.books.get(slot))
            .cloned()
            .ok_or_else(|| BookRepositoryError::NotFound(book_id.to_string()))
    }

    async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .shelf
            .read()
            .books
            .values()
            .filter(|book| book.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_book(
        &self,
        book_id: &str,
        patch: BookDetailsPatch,
    ) -> Result<Option<Book>, BookRepositoryError> {
        let mut shelf = self.shelf.write();
        if let Some(book) = shelf.get_mut(book_id) {
            let mut result_details = json!(book.details);
            json_patch::merge(&mut result_details, &json!(patch));
            book.details = serde_json::from_value(result_details)?;
            Ok(Some(book.clone()))
        } else {
            Ok(None)
        }
    }

    async fn delete_book(&self, book_id: &str) -> Result<Option<Book>, BookRepositoryError> {
        let mut shelf = self.shelf.write();
        Ok(match shelf.slots.remove(book_id) {
            Some(slot) => shelf.books.remove(&slot),
            None => None,
        })
    }

    async fn set_status(
        &self,
        book_id: &str,
        status: Option<ReadingStatus>,
    ) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.shelf.write().get_mut(book_id).map(|book| {
            book.details.status = status;
            book.clone()
        }))
    }

    async fn clear_genre(&self, genre: &str) -> Result<u64, BookRepositoryError> {
        let genre = genre.to_lowercase();
        let mut changed = 0;
        for book in self.shelf.write().books.values_mut() {
            if book
                .details
                .genre
                .as_ref()
                .is_some_and(|current| current.to_lowercase() == genre)
            {
                book.details.genre = None;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod in_memory_book_repository_tests {
    use crate::api::{BookDetails, BookDetailsPatch, ReadingStatus};
    use crate::books_repository::{BookRepository, BookRepositoryError, InMemoryBookRepository};

    fn details(title: &str) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "Machado de Assis".to_string(),
            cover_url: "".to_string(),
            genre: Some("Romance".to_string()),
            year: Some(1899),
            pages: Some(256),
            rating: Some(5),
            synopsis: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_add_book_and_get_it() {
        let repo = InMemoryBookRepository::default();

        let book_not_found = repo.get_book("1_20000").await;
        assert!(matches!(
            book_not_found,
            Err(BookRepositoryError::NotFound(..))
        ));

        let book = repo
            .add_book(1, details("Dom Casmurro"))
            .await
            .expect("Failed to add book");
        assert!(book.id.starts_with("1_"));
        assert_eq!(book.user_id, 1);

        let stored = repo.get_book(&book.id).await.expect("Failed to get book");
        assert_eq!(stored, book);
    }

    #[tokio::test]
    async fn test_books_are_listed_per_user_in_insertion_order() {
        let repo = InMemoryBookRepository::default();
        assert_eq!(repo.list_books(1).await.unwrap(), vec![]);

        let first = repo.add_book(1, details("b")).await.unwrap();
        let other_user = repo.add_book(2, details("c")).await.unwrap();
        let second = repo.add_book(1, details("a")).await.unwrap();

        assert_eq!(repo.list_books(1).await.unwrap(), vec![first, second]);
        assert_eq!(repo.list_books(2).await.unwrap(), vec![other_user]);
    }

    #[tokio::test]
    async fn test_add_book_patch_and_get_it() {
        let repo = InMemoryBookRepository::default();
        let result = repo
            .update_book("1_2000", BookDetailsPatch::default())
            .await
            .expect("Failed to update");
        assert_eq!(result, None);

        let book = repo.add_book(1, details("xx")).await.unwrap();

        let patch_title_only = BookDetailsPatch {
            title: Some("patchedTitle".to_string()),
            ..BookDetailsPatch::default()
        };
        let patched = repo
            .update_book(&book.id, patch_title_only)
            .await
            .expect("Failed to patch")
            .expect("Book not found");
        assert_eq!(
            patched.details,
            BookDetails {
                title: "patchedTitle".to_string(),
                ..details("xx")
            }
        );

        let patch_all_fields = BookDetailsPatch {
            title: Some("t".to_string()),
            author: Some("a".to_string()),
            cover_url: Some("c".to_string()),
            genre: Some(Some("g".to_string())),
            year: Some(Some(2001)),
            pages: Some(Some(10)),
            rating: Some(Some(1)),
            synopsis: Some(Some("s".to_string())),
            status: Some(Some(ReadingStatus::Reading)),
        };
        repo.update_book(&book.id, patch_all_fields).await.unwrap();

        assert_eq!(
            repo.get_book(&book.id).await.unwrap().details,
            BookDetails {
                title: "t".to_string(),
                author: "a".to_string(),
                cover_url: "c".to_string(),
                genre: Some("g".to_string()),
                year: Some(2001),
                pages: Some(10),
                rating: Some(1),
                synopsis: Some("s".to_string()),
                status: Some(ReadingStatus::Reading),
            }
        );

        let clear_optional_fields = BookDetailsPatch {
            genre: Some(None),
            rating: Some(None),
            status: Some(None),
            ..BookDetailsPatch::default()
        };
        let cleared = repo
            .update_book(&book.id, clear_optional_fields)
            .await
            .unwrap()
            .expect("Book not found");
        assert_eq!(cleared.details.genre, None);
        assert_eq!(cleared.details.rating, None);
        assert_eq!(cleared.details.status, None);
        assert_eq!(cleared.details.year, Some(2001));
    }

    #[tokio::test]
    async fn test_delete_book() {
        let repo = InMemoryBookRepository::default();
        let book = repo.add_book(1, details("xx")).await.unwrap();

        assert_eq!(repo.delete_book(&book.id).await.unwrap(), Some(book.clone()));
        assert_eq!(repo.delete_book(&book.id).await.unwrap(), None);
        assert!(matches!(
            repo.get_book(&book.id).await,
            Err(BookRepositoryError::NotFound(..))
        ));
        assert_eq!(repo.list_books(1).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_set_status_and_clear_genre() {
        let repo = InMemoryBookRepository::default();
        let romance = repo.add_book(1, details("a")).await.unwrap();
        let other = repo
            .add_book(
                2,
                BookDetails {
                    genre: Some("Fantasia".to_string()),
                    ..details("b")
                },
            )
            .await
            .unwrap();

        let updated = repo
            .set_status(&romance.id, Some(ReadingStatus::Read))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.details.status, Some(ReadingStatus::Read));
        assert_eq!(repo.set_status("9_9", None).await.unwrap(), None);

        assert_eq!(repo.clear_genre("ROMANCE").await.unwrap(), 1);
        assert_eq!(repo.get_book(&romance.id).await.unwrap().details.genre, None);
        assert_eq!(
            repo.get_book(&other.id).await.unwrap().details.genre.as_deref(),
            Some("Fantasia")
        );
    }
}
