/// Token record database operations
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::TokenStore;
use crate::error::Result;
use crate::models::{NewTokenRecord, TokenKind, TokenRecord};

const INSERT_TOKEN: &str = r#"
    INSERT INTO account_tokens (id, owner_account_id, kind, value, expires_at, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, owner_account_id, kind, value, expires_at, created_at
"#;

#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn create(&self, record: NewTokenRecord) -> Result<TokenRecord> {
        let created = sqlx::query_as::<_, TokenRecord>(INSERT_TOKEN)
            .bind(Uuid::new_v4())
            .bind(record.owner_account_id())
            .bind(record.kind())
            .bind(record.value())
            .bind(record.expires_at())
            .bind(record.created_at())
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_owner_and_value(
        &self,
        owner: Uuid,
        value: &str,
    ) -> Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, owner_account_id, kind, value, expires_at, created_at
            FROM account_tokens
            WHERE owner_account_id = $1 AND value = $2
            "#,
        )
        .bind(owner)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<TokenRecord>> {
        let records = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, owner_account_id, kind, value, expires_at, created_at
            FROM account_tokens
            WHERE owner_account_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM account_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_many(&self, owner: Uuid, kind: TokenKind) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM account_tokens WHERE owner_account_id = $1 AND kind = $2")
                .bind(owner)
                .bind(kind)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn rotate(
        &self,
        consumed: Uuid,
        replacement: NewTokenRecord,
    ) -> Result<Option<TokenRecord>> {
        let mut tx = self.pool.begin().await?;

        // A concurrent rotation of the same row blocks here until the first
        // commits, then sees zero rows.
        let deleted = sqlx::query("DELETE FROM account_tokens WHERE id = $1")
            .bind(consumed)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            debug!(token_id = %consumed, "Rotation skipped: record already consumed");
            return Ok(None);
        }

        let created = sqlx::query_as::<_, TokenRecord>(INSERT_TOKEN)
            .bind(Uuid::new_v4())
            .bind(replacement.owner_account_id())
            .bind(replacement.kind())
            .bind(replacement.value())
            .bind(replacement.expires_at())
            .bind(replacement.created_at())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(created))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM account_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
