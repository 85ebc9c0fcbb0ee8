use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, DatabaseError};
use crate::validators::{NewUser, UserUpdate};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub user_name: String,
    pub account_number: i64,
    pub email_address: String,
    pub identity_number: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(user: &NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user.user_name.clone(),
            account_number: user.account_number,
            email_address: user.email_address.clone(),
            identity_number: user.identity_number.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, update: &UserUpdate) {
        if let Some(user_name) = &update.user_name {
            self.user_name = user_name.clone();
        }
        if let Some(account_number) = update.account_number {
            self.account_number = account_number;
        }
        if let Some(email_address) = &update.email_address {
            self.email_address = email_address.clone();
        }
        if let Some(identity_number) = &update.identity_number {
            self.identity_number = identity_number.clone();
        }
    }
}

/// Listing view of a user; the identity number stays server-side
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub user_name: String,
    pub email_address: String,
    pub account_number: i64,
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            user_name: record.user_name,
            email_address: record.email_address,
            account_number: record.account_number,
        }
    }
}

/// One page of users, optionally filtered by exact match
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub account_number: Option<i64>,
    pub identity_number: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            account_number: None,
            identity_number: None,
        }
    }
}

impl UserQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn matches(&self, record: &UserRecord) -> bool {
        self.account_number.map_or(true, |n| record.account_number == n)
            && self
                .identity_number
                .as_deref()
                .map_or(true, |id| record.identity_number == id)
    }
}

/// User record store
///
/// `(account_number, identity_number)` is unique; a clash fails with
/// `DatabaseError::UniqueConstraintViolation`. Updates and deletes of an
/// unknown id fail with `DatabaseError::NotFound`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<UserRecord, AppError>;

    async fn list(&self, query: &UserQuery) -> Result<Vec<UserRecord>, AppError>;

    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

pub(crate) fn user_not_found(id: Uuid) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("user {}", id)))
}

pub struct PgUserRepository {
    pool: PgPool,
    table: String,
}

impl PgUserRepository {
    /// `table` must already be a validated SQL identifier
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let statement = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                user_name TEXT NOT NULL,
                account_number BIGINT NOT NULL,
                email_address TEXT NOT NULL,
                identity_number TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                CONSTRAINT {table}_account_identity_key UNIQUE (account_number, identity_number)
            )
            "#,
            table = self.table
        );
        sqlx::query(&statement).execute(&self.pool).await?;

        tracing::info!(table = %self.table, "User table ready");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<UserRecord, AppError> {
        let record = UserRecord::new(user);
        let statement = format!(
            r#"
            INSERT INTO {} (id, user_name, account_number, email_address, identity_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            self.table
        );

        sqlx::query(&statement)
            .bind(record.id)
            .bind(&record.user_name)
            .bind(record.account_number)
            .bind(&record.email_address)
            .bind(&record.identity_number)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<UserRecord>, AppError> {
        let statement = format!(
            r#"
            SELECT id, user_name, account_number, email_address, identity_number, created_at
            FROM {}
            WHERE ($1::BIGINT IS NULL OR account_number = $1)
              AND ($2::TEXT IS NULL OR identity_number = $2)
            ORDER BY created_at, id
            LIMIT $3 OFFSET $4
            "#,
            self.table
        );

        let users = sqlx::query_as::<_, UserRecord>(&statement)
            .bind(query.account_number)
            .bind(query.identity_number.as_deref())
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<(), AppError> {
        let statement = format!(
            r#"
            UPDATE {}
            SET user_name = COALESCE($1, user_name),
                account_number = COALESCE($2, account_number),
                email_address = COALESCE($3, email_address),
                identity_number = COALESCE($4, identity_number)
            WHERE id = $5
            "#,
            self.table
        );

        let result = sqlx::query(&statement)
            .bind(update.user_name.as_deref())
            .bind(update.account_number)
            .bind(update.email_address.as_deref())
            .bind(update.identity_number.as_deref())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let statement = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = sqlx::query(&statement).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }
}
