use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::error::{Result, SessionError};

/// Kind of an outstanding token record, matching database `token_kind`
///
/// New kinds need an explicit variant (and a migration); nothing in this
/// crate accepts free-form kind strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "token_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TokenKind {
    RefreshToken,
    ActivateAccount,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::RefreshToken => "refresh_token",
            TokenKind::ActivateAccount => "activate_account",
        }
    }
}

/// Persisted token record; created or deleted, never updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TokenRecord {
    pub id: Uuid,
    pub owner_account_id: Uuid,
    pub kind: TokenKind,
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Expired records are treated as absent
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Token record before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTokenRecord {
    owner_account_id: Uuid,
    kind: TokenKind,
    value: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl NewTokenRecord {
    /// Rejects records that would not expire strictly after `created_at`
    pub fn new(
        owner_account_id: Uuid,
        kind: TokenKind,
        value: impl Into<String>,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if expires_at <= created_at {
            return Err(SessionError::Internal(format!(
                "{} record must expire after it is created",
                kind.as_str()
            )));
        }

        Ok(Self {
            owner_account_id,
            kind,
            value: value.into(),
            expires_at,
            created_at,
        })
    }

    pub fn owner_account_id(&self) -> Uuid {
        self.owner_account_id
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attach a generated id
    pub fn into_record(self, id: Uuid) -> TokenRecord {
        TokenRecord {
            id,
            owner_account_id: self.owner_account_id,
            kind: self.kind,
            value: self.value,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}
