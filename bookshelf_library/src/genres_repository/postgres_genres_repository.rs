use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::{Client, Row, Statement};

use crate::api::Genre;
use crate::genres_repository::{GenresRepository, GenresRepositoryError};
use crate::postgres::is_unique_violation;

pub struct PostgresGenresRepository {
    client: Arc<Client>,
}

impl PostgresGenresRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS genres (
            id              SERIAL PRIMARY KEY,
            name            TEXT NOT NULL
            );
        CREATE UNIQUE INDEX IF NOT EXISTS genres_name_idx ON genres (lower(name));
        ",
            )
            .await
            .context("Failed to setup genres table")?;
        Ok(Self { client })
    }
}

fn genre_from_row(row: &Row) -> Result<Genre, GenresRepositoryError> {
    Ok(Genre {
        id: row.try_get(0)?,
        name: row.try_get(1)?,
    })
}

#[async_trait::async_trait]
impl GenresRepository for PostgresGenresRepository {
    async fn add_genre(&self, name: &str) -> Result<Genre, GenresRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO genres (name) VALUES ($1) RETURNING id, name")
            .await?;

        match self.client.query(&stmt, &[&name]).await {
            Ok(rows) => rows
                .first()
                .map(genre_from_row)
                .transpose()?
                .ok_or_else(|| GenresRepositoryError::Other("Id not returned".to_string())),
            Err(err) if is_unique_violation(&err) => {
                Err(GenresRepositoryError::AlreadyExists(name.to_string()))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }

    async fn find_genre(&self, name: &str) -> Result<Option<Genre>, GenresRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, name FROM genres WHERE lower(name) = lower($1)")
            .await?;
        let rows = self.client.query(&stmt, &[&name]).await?;
        rows.first().map(genre_from_row).transpose()
    }

    async fn list_genres(&self) -> Result<Vec<Genre>, GenresRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, name FROM genres ORDER BY name COLLATE \"C\"")
            .await?;
        let rows = self.client.query(&stmt, &[]).await?;
        rows.iter().map(genre_from_row).collect()
    }

    async fn delete_genre(&self, name: &str) -> Result<Option<Genre>, GenresRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM genres WHERE lower(name) = lower($1) RETURNING id, name")
            .await?;
        let rows = self.client.query(&stmt, &[&name]).await?;
        rows.first().map(genre_from_row).transpose()
    }
}
