/// Email/password verification against stored credentials
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::AccountRepository;
use crate::error::{Result, SessionError};
use crate::models::Account;
use crate::security::PasswordHasher;

const DECOY_PASSWORD: &str = "decoy-password-never-stored";

#[derive(Clone)]
pub struct CredentialVerifier {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
    /// Hashed once on first use, with the same parameters as real hashes
    decoy_hash: Arc<OnceCell<String>>,
}

impl CredentialVerifier {
    pub fn new(accounts: Arc<dyn AccountRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            accounts,
            hasher,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Return the account owning `email` if `password` matches its hash
    ///
    /// Unknown email and wrong password are indistinguishable to the caller:
    /// both yield `InvalidCredentials` after one hash comparison.
    pub async fn verify(&self, email: &str, password: &str) -> Result<Account> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            debug!("Credential check failed: unknown email");
            self.compare_against_decoy(password).await;
            return Err(SessionError::InvalidCredentials);
        };

        let hasher = Arc::clone(&self.hasher);
        let plaintext = password.to_string();
        let hash = account.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || hasher.compare(&plaintext, &hash)).await??;

        if !matches {
            debug!(account_id = %account.id, "Credential check failed: password mismatch");
            return Err(SessionError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Run one comparison against the decoy hash and discard the outcome
    async fn compare_against_decoy(&self, password: &str) {
        let hasher = Arc::clone(&self.hasher);
        let decoy = Arc::clone(&self.decoy_hash);
        let plaintext = password.to_string();

        let outcome = tokio::task::spawn_blocking(move || {
            let hash = decoy.get_or_try_init(|| hasher.hash(DECOY_PASSWORD))?;
            hasher.compare(&plaintext, hash)
        })
        .await;

        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "Decoy password comparison failed"),
            Err(e) => warn!(error = %e, "Decoy password comparison task failed"),
        }
    }
}
