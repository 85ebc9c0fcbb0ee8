/// In-memory stores
///
/// Each store keeps its rows behind one mutex, so the uniqueness check and the
/// insert happen in the same critical section, matching the guarantee the
/// database constraint gives the PostgreSQL stores.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::admin::AdminDirectory;
use super::user::{user_not_found, UserQuery, UserRecord, UserRepository};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::validators::{NewUser, UserUpdate};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
}

#[derive(Debug, Default)]
pub struct InMemoryAdminDirectory {
    admins: Mutex<HashMap<String, String>>,
}

impl InMemoryAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminDirectory for InMemoryAdminDirectory {
    async fn find_by_username(&self, username: &str) -> Result<String, AppError> {
        lock(&self.admins)?
            .get(username)
            .cloned()
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<(), AppError> {
        let mut admins = lock(&self.admins)?;
        if admins.contains_key(username) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "username".to_string(),
            )));
        }
        admins.insert(username.to_string(), password_hash.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_user() -> AppError {
    AppError::Database(DatabaseError::UniqueConstraintViolation(
        "accountNumber, identityNumber".to_string(),
    ))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &NewUser) -> Result<UserRecord, AppError> {
        let mut users = lock(&self.users)?;
        if users
            .iter()
            .any(|u| u.account_number == user.account_number && u.identity_number == user.identity_number)
        {
            return Err(duplicate_user());
        }

        let record = UserRecord::new(user);
        users.push(record.clone());
        Ok(record)
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<UserRecord>, AppError> {
        let users = lock(&self.users)?;
        Ok(users
            .iter()
            .filter(|u| query.matches(u))
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<(), AppError> {
        let mut users = lock(&self.users)?;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| user_not_found(id))?;

        let mut updated = users[index].clone();
        updated.apply(update);
        if users.iter().any(|u| {
            u.id != id
                && u.account_number == updated.account_number
                && u.identity_number == updated.identity_number
        }) {
            return Err(duplicate_user());
        }

        users[index] = updated;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = lock(&self.users)?;
        let before = users.len();
        users.retain(|u| u.id != id);

        if users.len() == before {
            return Err(user_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(account_number: i64) -> NewUser {
        NewUser {
            user_name: "budisukabapak".to_string(),
            account_number,
            email_address: "admin@example.com".to_string(),
            identity_number: "3174041303123458".to_string(),
        }
    }

    #[tokio::test]
    async fn test_admin_directory_round_trip() {
        let directory = InMemoryAdminDirectory::new();
        directory.insert("admin", "$2b$10$hash").await.unwrap();

        assert_eq!(directory.find_by_username("admin").await.unwrap(), "$2b$10$hash");
        assert!(matches!(
            directory.find_by_username("nobody").await,
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_admin_directory_rejects_duplicates() {
        let directory = InMemoryAdminDirectory::new();
        directory.insert("admin", "first").await.unwrap();

        let result = directory.insert("admin", "second").await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));
        assert_eq!(directory.find_by_username("admin").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_user_crud() {
        let repository = InMemoryUserRepository::new();
        let created = repository.create(&new_user(3123412345)).await.unwrap();

        let users = repository.list(&UserQuery::default()).await.unwrap();
        assert_eq!(users, vec![created.clone()]);

        repository
            .update(
                created.id,
                &UserUpdate {
                    user_name: Some("renamed".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        let users = repository.list(&UserQuery::default()).await.unwrap();
        assert_eq!(users[0].user_name, "renamed");

        repository.delete(created.id).await.unwrap();
        assert!(repository.list(&UserQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_uniqueness_and_missing_ids() {
        let repository = InMemoryUserRepository::new();
        repository.create(&new_user(1)).await.unwrap();
        let second = repository.create(&new_user(2)).await.unwrap();

        assert!(matches!(
            repository.create(&new_user(1)).await,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));

        let clash = UserUpdate {
            account_number: Some(1),
            ..UserUpdate::default()
        };
        assert!(matches!(
            repository.update(second.id, &clash).await,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));

        let missing = Uuid::new_v4();
        assert!(matches!(
            repository.delete(missing).await,
            Err(AppError::Database(DatabaseError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_pagination() {
        let repository = InMemoryUserRepository::new();
        for n in 0..15 {
            repository.create(&new_user(n)).await.unwrap();
        }

        let first = repository.list(&UserQuery::default()).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].account_number, 0);

        let second = repository
            .list(&UserQuery {
                page: 2,
                ..UserQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].account_number, 10);

        let filtered = repository
            .list(&UserQuery {
                account_number: Some(7),
                ..UserQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }
}
