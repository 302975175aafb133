/// Access/refresh pair minting
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::db::TokenStore;
use crate::error::Result;
use crate::models::{Account, NewTokenRecord, TokenKind, TokenPair};
use crate::security::{JwtCodec, TokenClass};

#[derive(Clone)]
pub struct SessionIssuer {
    tokens: Arc<dyn TokenStore>,
    codec: Arc<JwtCodec>,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    pub fn new(tokens: Arc<dyn TokenStore>, codec: Arc<JwtCodec>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens,
            codec,
            clock,
        }
    }

    /// Sign a fresh pair without persisting anything
    ///
    /// The returned record describes the refresh token; callers persist it
    /// either directly (`issue`) or as the replacement half of a rotation.
    pub fn mint(&self, account: &Account) -> Result<(TokenPair, NewTokenRecord)> {
        let now = self.clock.now();
        let subject = account.id.to_string();

        let access = self.codec.sign(TokenClass::Access, &subject, None, now)?;
        let refresh = self
            .codec
            .sign(TokenClass::Refresh, &subject, Some(&account.email), now)?;

        // Record and `exp` share one deadline
        let record = NewTokenRecord::new(
            account.id,
            TokenKind::RefreshToken,
            refresh.token.clone(),
            refresh.expires_at,
            now,
        )?;

        Ok((
            TokenPair {
                access_token: access.token,
                refresh_token: refresh.token,
            },
            record,
        ))
    }

    /// Mint a pair and persist its refresh record
    pub async fn issue(&self, account: &Account) -> Result<TokenPair> {
        let (pair, record) = self.mint(account)?;
        let stored = self.tokens.create(record).await?;

        debug!(
            account_id = %account.id,
            token_id = %stored.id,
            expires_at = %stored.expires_at,
            "Issued session"
        );

        Ok(pair)
    }
}
