pub use in_memory_users_repository::InMemoryUsersRepository;
pub use postgres_users_repository::PostgresUsersRepository;

use crate::api::{User, UserId};

mod in_memory_users_repository;
mod postgres_users_repository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    /// Already normalized, see [`normalize_email`]
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl UserRecord {
    fn new(id: UserId, user: NewUser) -> Self {
        Self {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: user.created_at,
        }
    }

    /// The user without credentials
    pub fn public(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, thiserror::Error)]
pub enum UsersRepositoryError {
    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Email {0} already registered")]
    EmailTaken(String),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait UsersRepository: Send + Sync {
    /// Adds user, fails with EmailTaken when the email is already used
    async fn add_user(&self, user: NewUser) -> Result<UserId, UsersRepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<UserRecord, UsersRepositoryError>;

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UsersRepositoryError>;
}
