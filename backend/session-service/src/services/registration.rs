/// Pending-account creation
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::db::AccountRepository;
use crate::error::{Result, SessionError};
use crate::models::{Account, NewAccount};
use crate::security::{validate_password_strength, PasswordHasher};
use crate::validators::{validate_email, validate_username};

/// Sign-up payload carrying the plaintext password
#[derive(Clone)]
pub struct NewRegistration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for NewRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRegistration")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Registration {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Registration {
    pub fn new(accounts: Arc<dyn AccountRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { accounts, hasher }
    }

    /// Create an account in the pending (not activated) state
    ///
    /// ## Errors
    ///
    /// - `InvalidEmail` / `InvalidUsername` for malformed identifiers
    /// - `WeakPassword` when the password fails the strength rules
    /// - `EmailAlreadyExists` / `UsernameAlreadyExists` on conflicts
    pub async fn register(&self, registration: NewRegistration) -> Result<Account> {
        let NewRegistration {
            name,
            username,
            email,
            password,
        } = registration;

        if !validate_email(&email) {
            return Err(SessionError::InvalidEmail);
        }
        if !validate_username(&username) {
            return Err(SessionError::InvalidUsername);
        }
        validate_password_strength(&password)?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(SessionError::EmailAlreadyExists);
        }
        if self.accounts.find_by_username(&username).await?.is_some() {
            return Err(SessionError::UsernameAlreadyExists);
        }

        let hasher = Arc::clone(&self.hasher);
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        // The unique constraints still decide races between the checks above
        let account = self
            .accounts
            .create(NewAccount {
                name,
                username,
                email,
                password_hash,
                activated: false,
            })
            .await?;

        info!(account_id = %account.id, "Registered pending account");
        Ok(account)
    }
}
