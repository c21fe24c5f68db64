use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::auth::repo_types::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persisted mapping from email to password hash.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Create a new user with hashed password.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Replace the stored hash, returning the number of rows touched (0 or 1).
    async fn update_password_hash(&self, email: &str, new_hash: &str) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })
    }

    async fn update_password_hash(&self, email: &str, new_hash: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = $1, updated_at = now()
            WHERE email = $2
            "#,
        )
        .bind(new_hash)
        .bind(email)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Default)]
struct MemoryTable {
    users: HashMap<String, User>,
    last_id: i64,
}

/// Process-local store with the same uniqueness and id rules as the `users` table.
#[derive(Default)]
pub struct MemoryCredentialStore {
    table: Mutex<MemoryTable>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, MemoryTable> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table().users.get(email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut table = self.table();
        if table.users.contains_key(email) {
            return Err(StoreError::DuplicateEmail);
        }
        table.last_id += 1;
        let user = User {
            id: table.last_id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        table.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, email: &str, new_hash: &str) -> Result<u64, StoreError> {
        match self.table().users.get_mut(email) {
            Some(user) => {
                user.password_hash = new_hash.to_owned();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
