/// Activation gating and activation-token cleanup
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::credentials::CredentialVerifier;
use super::issuer::SessionIssuer;
use crate::db::{AccountRepository, TokenStore};
use crate::error::{Result, SessionError};
use crate::models::{TokenKind, TokenPair, TokenRecord};

#[derive(Clone)]
pub struct ActivationGate {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<dyn TokenStore>,
    verifier: CredentialVerifier,
    issuer: SessionIssuer,
}

impl ActivationGate {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<dyn TokenStore>,
        verifier: CredentialVerifier,
        issuer: SessionIssuer,
    ) -> Self {
        Self {
            accounts,
            tokens,
            verifier,
            issuer,
        }
    }

    /// Login: credentials, then activation state, then a fresh session
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<TokenPair> {
        let account = self.verifier.verify(email, password).await?;

        if !account.activated {
            info!(account_id = %account.id, "Login refused: account not activated");
            return Err(SessionError::NotActivated);
        }

        let pair = self.issuer.issue(&account).await?;
        info!(account_id = %account.id, "Account authenticated");
        Ok(pair)
    }

    /// Delete the activation records among `records`; other kinds are skipped
    pub async fn delete_activate_account_tokens(&self, records: &[TokenRecord]) -> Result<()> {
        for record in records
            .iter()
            .filter(|record| record.kind == TokenKind::ActivateAccount)
        {
            self.tokens.delete_by_id(record.id).await?;
            debug!(
                account_id = %record.owner_account_id,
                token_id = %record.id,
                "Deleted activation token"
            );
        }

        Ok(())
    }

    /// Mark an account active and drop its outstanding activation records
    ///
    /// Activating an already active account only repeats the cleanup.
    pub async fn activate(&self, account_id: Uuid) -> Result<()> {
        if !self.accounts.update_activated_flag(account_id, true).await? {
            return Err(SessionError::AccountNotFound);
        }

        let records = self.tokens.find_by_owner(account_id).await?;
        self.delete_activate_account_tokens(&records).await?;

        info!(account_id = %account_id, "Account activated");
        Ok(())
    }
}
