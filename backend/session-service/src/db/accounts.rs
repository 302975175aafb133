/// Account database operations
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::AccountRepository;
use crate::error::{Result, SessionError};
use crate::models::{Account, NewAccount};

const ACCOUNT_COLUMNS: &str = "id, name, username, email, password_hash, profile_picture, \
                               activated, created_at, updated_at";

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique-constraint violations on `accounts` to conflict errors
fn map_insert_error(err: sqlx::Error) -> SessionError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("username") {
                return SessionError::UsernameAlreadyExists;
            }
            if constraint.contains("email") {
                return SessionError::EmailAlreadyExists;
            }
        }
    }
    SessionError::from(err)
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn update_activated_flag(&self, id: Uuid, activated: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET activated = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(activated)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (id, name, username, email, password_hash, activated, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.activated)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(created)
    }
}
