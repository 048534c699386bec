use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::{Client, Row, Statement};

use crate::api::UserId;
use crate::postgres::is_unique_violation;
use crate::users_repository::{NewUser, UserRecord, UsersRepository, UsersRepositoryError};

pub struct PostgresUsersRepository {
    client: Arc<Client>,
}

impl PostgresUsersRepository {
    pub async fn init(client: Arc<Client>) -> anyhow::Result<Self> {
        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS users (
            id              SERIAL PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      BIGINT NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup users table")?;
        Ok(Self { client })
    }
}

fn user_from_row(row: &Row) -> Result<UserRecord, UsersRepositoryError> {
    Ok(UserRecord {
        id: row.try_get(0)?,
        name: row.try_get(1)?,
        email: row.try_get(2)?,
        password_hash: row.try_get(3)?,
        created_at: row.try_get(4)?,
    })
}

#[async_trait::async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn add_user(&self, user: NewUser) -> Result<UserId, UsersRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "INSERT INTO users (name, email, password_hash, created_at)
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &user.name,
                    &user.email,
                    &user.password_hash,
                    &user.created_at,
                ],
            )
            .await;

        match rows {
            Ok(rows) => Ok(rows
                .first()
                .ok_or_else(|| UsersRepositoryError::Other("Id not returned".to_string()))?
                .try_get(0)?),
            Err(err) if is_unique_violation(&err) => {
                Err(UsersRepositoryError::EmailTaken(user.email))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }

    async fn get_user(&self, id: UserId) -> Result<UserRecord, UsersRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, name, email, password_hash, created_at FROM users WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&id]).await?;

        user_from_row(
            rows.first()
                .ok_or(UsersRepositoryError::UserNotFound(id))?,
        )
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UsersRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ($1)",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&email]).await?;
        rows.first().map(user_from_row).transpose()
    }
}

#[cfg(test)]
mod tests_postgres_users_repository {
    use serial_test::file_serial;

    use super::*;
    use crate::postgres::test_container::start_postgres_container;

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    async fn test_user_management() {
        let (_container, client) = start_postgres_container().await;
        let repository = PostgresUsersRepository::init(client).await.unwrap();

        let new_user = NewUser {
            name: "Maria Santos".to_string(),
            email: "maria@exemplo.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: 1_708_387_200,
        };
        let user_id = repository.add_user(new_user.clone()).await.unwrap();

        let stored = repository.get_user(user_id).await.unwrap();
        assert_eq!(stored.name, "Maria Santos");
        assert_eq!(stored.created_at, 1_708_387_200);
        assert_eq!(
            repository
                .find_user_by_email("maria@exemplo.com")
                .await
                .unwrap(),
            Some(stored)
        );
        assert_eq!(
            repository.find_user_by_email("pedro@exemplo.com").await.unwrap(),
            None
        );

        assert!(matches!(
            repository.add_user(new_user).await,
            Err(UsersRepositoryError::EmailTaken(..))
        ));
        assert!(matches!(
            repository.get_user(user_id + 100).await,
            Err(UsersRepositoryError::UserNotFound(..))
        ));
    }
}
