use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{Book, BookDetails, BookDetailsPatch, ReadingStatus, UserId};
use crate::books_repository::{BookRepository, BookRepositoryError};

pub struct PostgresBooksRepository {
    client: Arc<Client>,
}

impl PostgresBooksRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE SEQUENCE IF NOT EXISTS book_slots;
        CREATE TABLE IF NOT EXISTS books (
            slot            BIGINT PRIMARY KEY,
            id              TEXT NOT NULL UNIQUE,
            user_id         INTEGER NOT NULL,
            params          JSONB NOT NULL
            );
        CREATE INDEX IF NOT EXISTS books_user_id_idx ON books (user_id);
        ",
            )
            .await
            .context("Failed to setup books table")?;
        Ok(Self { client })
    }
}

fn book_from_row(row: &Row) -> Result<Book, BookRepositoryError> {
    let details: serde_json::Value = row.try_get(2)?;
    Ok(Book {
        id: row.try_get(0)?,
        user_id: row.try_get(1)?,
        details: serde_json::from_value(details)?,
    })
}

fn first_book(rows: &[Row]) -> Result<Option<Book>, BookRepositoryError> {
    rows.first().map(book_from_row).transpose()
}

#[async_trait::async_trait]
impl BookRepository for PostgresBooksRepository {
    async fn add_book(
        &self,
        user_id: UserId,
        details: BookDetails,
    ) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "WITH next AS (SELECT nextval('book_slots') AS slot)
                 INSERT INTO books (slot, id, user_id, params)
                 SELECT slot, ($1)::TEXT || '_' || slot::TEXT, $2, $3 FROM next
                 RETURNING id, user_id, params",
            )
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&user_id.to_string(), &user_id, &json!(details)])
            .await?;

        first_book(&rows)?.ok_or_else(|| BookRepositoryError::Other("Id not returned".to_string()))
    }

    async fn get_book(&self, book_id: &str) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, user_id, params FROM books WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;

        first_book(&rows)?.ok_or_else(|| BookRepositoryError::NotFound(book_id.to_string()))
    }

    async fn list_books(&self, user_id: UserId) -> Result<Vec<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, user_id, params FROM books WHERE user_id = ($1) ORDER BY slot")
            .await?;

        let rows = self.client.query(&stmt, &[&user_id]).await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn update_book(
        &self,
        book_id: &str,
        patch: BookDetailsPatch,
    ) -> Result<Option<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books SET params = params || ($1)::JSONB WHERE id = ($2)
                 RETURNING id, user_id, params",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&json!(patch), &book_id]).await?;
        first_book(&rows)
    }

    async fn delete_book(&self, book_id: &str) -> Result<Option<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE id = ($1) RETURNING id, user_id, params")
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;
        first_book(&rows)
    }

    async fn set_status(
        &self,
        book_id: &str,
        status: Option<ReadingStatus>,
    ) -> Result<Option<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books SET params = jsonb_set(params, '{status}', ($1)::JSONB) WHERE id = ($2)
                 RETURNING id, user_id, params",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&json!(status), &book_id]).await?;
        first_book(&rows)
    }

    async fn clear_genre(&self, genre: &str) -> Result<u64, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books SET params = jsonb_set(params, '{genre}', 'null'::JSONB)
                 WHERE lower(params->>'genre') = lower($1)",
            )
            .await?;

        Ok(self.client.execute(&stmt, &[&genre]).await?)
    }
}

#[cfg(test)]
mod postgres_book_repository_tests {
    use serial_test::file_serial;
    use testcontainers::{ContainerAsync, GenericImage};

    use crate::api::{BookDetails, BookDetailsPatch, ReadingStatus};
    use crate::books_repository::{BookRepository, BookRepositoryError, PostgresBooksRepository};
    use crate::postgres::test_container::start_postgres_container;

    async fn start_postgres_container_and_init_repo(
    ) -> (ContainerAsync<GenericImage>, PostgresBooksRepository) {
        let (container, client) = start_postgres_container().await;
        let repo = PostgresBooksRepository::init(client)
            .await
            .expect("Failed to init books repository");
        (container, repo)
    }

    fn details(title: &str) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "Aluísio Azevedo".to_string(),
            cover_url: "http://covers/cortico.jpg".to_string(),
            genre: Some("Romance".to_string()),
            year: Some(1890),
            pages: Some(300),
            rating: Some(4),
            synopsis: Some("Um cortiço no Rio de Janeiro".to_string()),
            status: None,
        }
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Covers add, get, list, patch and delete on a single container
    async fn test_book_lifecycle() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        assert!(matches!(
            repo.get_book("1_20000").await,
            Err(BookRepositoryError::NotFound(..))
        ));
        assert_eq!(repo.list_books(1).await.unwrap(), vec![]);

        let first = repo.add_book(1, details("O Cortiço")).await.unwrap();
        let foreign = repo.add_book(2, details("Outro")).await.unwrap();
        let second = repo.add_book(1, details("Casa de Pensão")).await.unwrap();
        assert!(first.id.starts_with("1_"));
        assert!(foreign.id.starts_with("2_"));

        assert_eq!(repo.get_book(&first.id).await.unwrap(), first);
        assert_eq!(
            repo.list_books(1).await.unwrap(),
            vec![first.clone(), second.clone()]
        );

        assert_eq!(
            repo.update_book("1_20000", BookDetailsPatch::default())
                .await
                .unwrap(),
            None
        );
        let patched = repo
            .update_book(
                &first.id,
                BookDetailsPatch {
                    title: Some("patchedTitle".to_string()),
                    rating: Some(Some(2)),
                    year: Some(None),
                    ..BookDetailsPatch::default()
                },
            )
            .await
            .unwrap()
            .expect("Book not found");
        assert_eq!(
            patched.details,
            BookDetails {
                title: "patchedTitle".to_string(),
                rating: Some(2),
                year: None,
                ..details("O Cortiço")
            }
        );

        assert_eq!(repo.delete_book(&second.id).await.unwrap(), Some(second.clone()));
        assert_eq!(repo.delete_book(&second.id).await.unwrap(), None);
        assert_eq!(repo.list_books(1).await.unwrap(), vec![patched]);
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    async fn test_status_and_genre_cascade() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;

        let book = repo.add_book(1, details("O Cortiço")).await.unwrap();
        let set = repo
            .set_status(&book.id, Some(ReadingStatus::WantToRead))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(set.details.status, Some(ReadingStatus::WantToRead));

        let cleared = repo.set_status(&book.id, None).await.unwrap().unwrap();
        assert_eq!(cleared.details.status, None);
        assert_eq!(repo.set_status("3_3", None).await.unwrap(), None);

        assert_eq!(repo.clear_genre("romance").await.unwrap(), 1);
        assert_eq!(repo.clear_genre("romance").await.unwrap(), 0);
        assert_eq!(repo.get_book(&book.id).await.unwrap().details.genre, None);
    }
}
