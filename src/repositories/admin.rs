use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

/// Admin credential store
///
/// Username uniqueness is the store's job: concurrent inserts of the same
/// name must leave exactly one row and fail the rest with
/// `DatabaseError::UniqueConstraintViolation`.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Stored password hash for `username`
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` when no such admin exists, so callers
    /// cannot tell an unknown username from a wrong password.
    async fn find_by_username(&self, username: &str) -> Result<String, AppError>;

    async fn insert(&self, username: &str, password_hash: &str) -> Result<(), AppError>;
}

pub struct PgAdminDirectory {
    pool: PgPool,
    table: String,
}

impl PgAdminDirectory {
    /// `table` must already be a validated SQL identifier
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Creates the admin table and its unique username constraint if missing
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let statement = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                CONSTRAINT {table}_username_key UNIQUE (username)
            )
            "#,
            table = self.table
        );
        sqlx::query(&statement).execute(&self.pool).await?;

        tracing::info!(table = %self.table, "Admin table ready");
        Ok(())
    }
}

#[async_trait]
impl AdminDirectory for PgAdminDirectory {
    async fn find_by_username(&self, username: &str) -> Result<String, AppError> {
        let statement = format!("SELECT password_hash FROM {} WHERE username = $1", self.table);

        sqlx::query_scalar::<_, String>(&statement)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<(), AppError> {
        let statement = format!(
            "INSERT INTO {} (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)",
            self.table
        );

        sqlx::query(&statement)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
