/// Refresh-token validation and rotation
///
/// Each refresh record moves `Issued -> Used` exactly once. The swap of the
/// consumed record for its replacement goes through `TokenStore::rotate`, so
/// two concurrent refreshes with the same token cannot both succeed.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::issuer::SessionIssuer;
use crate::clock::Clock;
use crate::db::{AccountRepository, TokenStore};
use crate::error::{Result, SessionError};
use crate::models::{RefreshedSession, TokenKind};
use crate::security::{token_fingerprint, Claims, JwtCodec, TokenClass};

/// What to do when a validly signed refresh token has no live record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Reject the request; sibling sessions stay valid
    #[default]
    RejectOnly,
    /// Reject and delete every outstanding refresh record of the account
    RevokeAll,
}

impl ReusePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReusePolicy::RejectOnly => "reject_only",
            ReusePolicy::RevokeAll => "revoke_all",
        }
    }
}

impl fmt::Display for ReusePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReusePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject_only" => Ok(ReusePolicy::RejectOnly),
            "revoke_all" => Ok(ReusePolicy::RevokeAll),
            other => Err(format!(
                "unknown reuse policy '{other}' (expected reject_only or revoke_all)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<dyn TokenStore>,
    codec: Arc<JwtCodec>,
    clock: Arc<dyn Clock>,
    issuer: SessionIssuer,
    policy: ReusePolicy,
}

impl RefreshCoordinator {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<dyn TokenStore>,
        codec: Arc<JwtCodec>,
        clock: Arc<dyn Clock>,
        issuer: SessionIssuer,
        policy: ReusePolicy,
    ) -> Self {
        Self {
            accounts,
            tokens,
            codec,
            clock,
            issuer,
            policy,
        }
    }

    pub fn policy(&self) -> ReusePolicy {
        self.policy
    }

    /// Exchange a live refresh token for a new pair
    ///
    /// ## Errors
    ///
    /// - `ExpiredOrInvalidSignature`: bad signature, wrong class, or `exp` passed
    /// - `ReuseOrUnknownToken`: no live record for the token, the owning
    ///   account is gone, or a concurrent refresh consumed it first
    pub async fn refresh(&self, raw: &str) -> Result<RefreshedSession> {
        let claims = self.verify_refresh(raw).await?;
        let account_id = subject_id(&claims)?;
        let now = self.clock.now();

        let record = self
            .tokens
            .find_by_owner_and_value(account_id, raw)
            .await?
            .filter(|record| record.kind == TokenKind::RefreshToken);

        let Some(record) = record else {
            return Err(self.reject_unknown(account_id, raw).await);
        };

        if record.is_expired_at(now) {
            self.tokens.delete_by_id(record.id).await?;
            info!(
                account_id = %account_id,
                token_id = %record.id,
                "Reaped expired refresh record at lookup"
            );
            return Err(SessionError::ReuseOrUnknownToken);
        }

        let Some(account) = self.accounts.find_by_id(account_id).await? else {
            self.tokens.delete_by_id(record.id).await?;
            warn!(
                account_id = %account_id,
                token_fingerprint = %token_fingerprint(raw),
                "Refresh token owner no longer exists; deleted orphaned record"
            );
            return Err(SessionError::ReuseOrUnknownToken);
        };

        let (pair, replacement) = self.issuer.mint(&account)?;

        let Some(rotated) = self.tokens.rotate(record.id, replacement).await? else {
            warn!(
                account_id = %account_id,
                token_fingerprint = %token_fingerprint(raw),
                "Refresh token consumed by a concurrent request"
            );
            return Err(SessionError::ReuseOrUnknownToken);
        };

        debug!(
            account_id = %account_id,
            consumed_token_id = %record.id,
            token_id = %rotated.id,
            "Rotated refresh token"
        );

        Ok(RefreshedSession {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            account: account.projection(),
        })
    }

    /// Logout: drop the record behind a refresh token, if any
    ///
    /// Idempotent once the signature checks out.
    pub async fn revoke(&self, raw: &str) -> Result<()> {
        let claims = self.verify_refresh(raw).await?;
        let account_id = subject_id(&claims)?;

        let record = self
            .tokens
            .find_by_owner_and_value(account_id, raw)
            .await?
            .filter(|record| record.kind == TokenKind::RefreshToken);

        if let Some(record) = record {
            self.tokens.delete_by_id(record.id).await?;
            info!(account_id = %account_id, token_id = %record.id, "Revoked refresh token");
        }

        Ok(())
    }

    /// Delete every outstanding refresh record of an account
    pub async fn revoke_all(&self, account_id: Uuid) -> Result<u64> {
        let revoked = self
            .tokens
            .delete_many(account_id, TokenKind::RefreshToken)
            .await?;
        info!(account_id = %account_id, revoked, "Revoked all refresh tokens");
        Ok(revoked)
    }

    async fn verify_refresh(&self, raw: &str) -> Result<Claims> {
        let codec = Arc::clone(&self.codec);
        let token = raw.to_string();
        let now = self.clock.now();

        let claims = tokio::task::spawn_blocking(move || {
            codec.verify(TokenClass::Refresh, &token, now)
        })
        .await?
        .map_err(|err| {
            debug!(token_fingerprint = %token_fingerprint(raw), "Refresh token rejected: {}", err);
            SessionError::from(err)
        })?;

        Ok(claims)
    }

    /// Log the unknown token, apply the reuse policy, and build the error
    async fn reject_unknown(&self, account_id: Uuid, raw: &str) -> SessionError {
        warn!(
            account_id = %account_id,
            token_fingerprint = %token_fingerprint(raw),
            policy = %self.policy,
            "Refresh token reused or unknown"
        );

        if self.policy == ReusePolicy::RevokeAll {
            match self
                .tokens
                .delete_many(account_id, TokenKind::RefreshToken)
                .await
            {
                Ok(revoked) => warn!(
                    account_id = %account_id,
                    revoked,
                    "Revoked all refresh tokens after reuse"
                ),
                Err(err) => return err,
            }
        }

        SessionError::ReuseOrUnknownToken
    }
}

/// Signed subjects are account ids; anything else was not minted here
fn subject_id(claims: &Claims) -> Result<Uuid> {
    Uuid::parse_str(&claims.sub).map_err(|_| SessionError::ExpiredOrInvalidSignature)
}
