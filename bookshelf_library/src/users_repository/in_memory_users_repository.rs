use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::api::UserId;
use crate::users_repository::{NewUser, UserRecord, UsersRepository, UsersRepositoryError};

#[derive(Default)]
pub struct InMemoryUsersRepository {
    users: parking_lot::RwLock<HashMap<UserId, UserRecord>>,
    user_sequence_generator: AtomicI32,
}

#[async_trait::async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn add_user(&self, user: NewUser) -> Result<UserId, UsersRepositoryError> {
        let mut users = self.users.write();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(UsersRepositoryError::EmailTaken(user.email));
        }
        let id = self.user_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        users.insert(id, UserRecord::new(id, user));
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<UserRecord, UsersRepositoryError> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or(UsersRepositoryError::UserNotFound(id))
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UsersRepositoryError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}
