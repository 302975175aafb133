/// In-process adapters
///
/// Same contracts as the PostgreSQL adapters, including `(owner, value)`
/// uniqueness and atomic rotation (one lock guards the whole swap).
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AccountRepository, TokenStore};
use crate::error::{Result, SessionError};
use crate::models::{Account, NewAccount, NewTokenRecord, TokenKind, TokenRecord};

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    // Insertion order doubles as the tie-breaker for equal `created_at`
    records: Mutex<Vec<TokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

fn insert_unique(records: &mut Vec<TokenRecord>, record: NewTokenRecord) -> Result<TokenRecord> {
    let duplicate = records.iter().any(|existing| {
        existing.owner_account_id == record.owner_account_id() && existing.value == record.value()
    });
    if duplicate {
        return Err(SessionError::Storage(
            "duplicate (owner_account_id, value) token record".to_string(),
        ));
    }

    let created = record.into_record(Uuid::new_v4());
    records.push(created.clone());
    Ok(created)
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create(&self, record: NewTokenRecord) -> Result<TokenRecord> {
        let mut records = self.records.lock().await;
        insert_unique(&mut records, record)
    }

    async fn find_by_owner_and_value(
        &self,
        owner: Uuid,
        value: &str,
    ) -> Result<Option<TokenRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .find(|r| r.owner_account_id == owner && r.value == value)
            .cloned())
    }

    async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<TokenRecord>> {
        let records = self.records.lock().await;
        let mut owned: Vec<TokenRecord> = records
            .iter()
            .filter(|r| r.owner_account_id == owner)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        owned.sort_by_key(|r| r.created_at);
        Ok(owned)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.records.lock().await.retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_many(&self, owner: Uuid, kind: TokenKind) -> Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !(r.owner_account_id == owner && r.kind == kind));
        Ok((before - records.len()) as u64)
    }

    async fn rotate(
        &self,
        consumed: Uuid,
        replacement: NewTokenRecord,
    ) -> Result<Option<TokenRecord>> {
        let mut records = self.records.lock().await;

        let Some(position) = records.iter().position(|r| r.id == consumed) else {
            return Ok(None);
        };
        let removed = records.remove(position);

        match insert_unique(&mut records, replacement) {
            Ok(created) => Ok(Some(created)),
            Err(err) => {
                // Roll back the delete so the swap stays all-or-nothing
                records.insert(position, removed);
                Err(err)
            }
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !r.is_expired_at(now));
        Ok((before - records.len()) as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully formed account, replacing any account with the same id
    pub async fn insert(&self, account: Account) {
        self.accounts.lock().await.insert(account.id, account);
    }

    pub async fn remove(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().await.remove(&id)
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.lock().await.get(&id).cloned())
    }

    async fn update_activated_flag(&self, id: Uuid, activated: bool) -> Result<bool> {
        let mut accounts = self.accounts.lock().await;
        match accounts.get_mut(&id) {
            Some(account) => {
                account.activated = activated;
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let mut accounts = self.accounts.lock().await;

        if accounts.values().any(|a| a.email == account.email) {
            return Err(SessionError::EmailAlreadyExists);
        }
        if accounts.values().any(|a| a.username == account.username) {
            return Err(SessionError::UsernameAlreadyExists);
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            profile_picture: None,
            activated: account.activated,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(created.id, created.clone());
        Ok(created)
    }
}
