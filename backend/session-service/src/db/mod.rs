/// Storage ports and their adapters
///
/// The services depend only on the `AccountRepository` and `TokenStore`
/// traits. Adapters:
///
/// - `accounts` / `tokens`: PostgreSQL via sqlx
/// - `memory`: in-process maps for tests and local tooling
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Account, NewAccount, NewTokenRecord, TokenKind, TokenRecord};

pub mod accounts;
pub mod memory;
pub mod tokens;

pub use accounts::PgAccountRepository;
pub use memory::{InMemoryAccountRepository, InMemoryTokenStore};
pub use tokens::PgTokenStore;

/// Account persistence owned outside the session core
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Returns `false` when no account has this id
    async fn update_activated_flag(&self, id: Uuid, activated: bool) -> Result<bool>;

    /// Fails with `EmailAlreadyExists` / `UsernameAlreadyExists` on conflicts
    async fn create(&self, account: NewAccount) -> Result<Account>;
}

/// Outstanding token records; pure persistence, no business rules
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn create(&self, record: NewTokenRecord) -> Result<TokenRecord>;

    async fn find_by_owner_and_value(&self, owner: Uuid, value: &str)
        -> Result<Option<TokenRecord>>;

    /// Ordered by creation time, oldest first
    async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<TokenRecord>>;

    /// No-op if absent
    async fn delete_by_id(&self, id: Uuid) -> Result<()>;

    /// Returns the number of deleted records
    async fn delete_many(&self, owner: Uuid, kind: TokenKind) -> Result<u64>;

    /// Delete `consumed` and create `replacement` as one atomic unit
    ///
    /// Returns `None`, creating nothing, when `consumed` no longer exists.
    async fn rotate(&self, consumed: Uuid, replacement: NewTokenRecord)
        -> Result<Option<TokenRecord>>;

    /// Delete every record with `expires_at <= now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
