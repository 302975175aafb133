/// Session services
///
/// - **credentials**: email/password verification
/// - **issuer**: access/refresh pair minting and refresh-record persistence
/// - **refresh**: refresh-token rotation, logout, and reuse handling
/// - **activation**: activation gate on login, activation-token cleanup
/// - **registration**: pending-account creation
/// - **reaper**: background sweep of expired records
///
/// `SessionService` wires them over one set of ports and is the boundary
/// callers use.
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::{AccountRepository, TokenStore};
use crate::error::Result;
use crate::models::{Account, RefreshedSession, TokenPair, TokenRecord};
use crate::security::{JwtCodec, PasswordHasher};

pub mod activation;
pub mod credentials;
pub mod issuer;
pub mod reaper;
pub mod refresh;
pub mod registration;

pub use activation::ActivationGate;
pub use credentials::CredentialVerifier;
pub use issuer::SessionIssuer;
pub use reaper::{spawn_token_reaper, sweep_expired_tokens};
pub use refresh::{RefreshCoordinator, ReusePolicy};
pub use registration::{NewRegistration, Registration};

/// Ports and shared collaborators the services run on
#[derive(Clone)]
pub struct SessionDeps {
    pub accounts: Arc<dyn AccountRepository>,
    pub tokens: Arc<dyn TokenStore>,
    pub clock: Arc<dyn Clock>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub codec: Arc<JwtCodec>,
}

#[derive(Clone)]
pub struct SessionService {
    gate: ActivationGate,
    refresh: RefreshCoordinator,
    registration: Registration,
}

impl SessionService {
    pub fn new(deps: SessionDeps, reuse_policy: ReusePolicy) -> Self {
        let SessionDeps {
            accounts,
            tokens,
            clock,
            hasher,
            codec,
        } = deps;

        let verifier = CredentialVerifier::new(accounts.clone(), hasher.clone());
        let issuer = SessionIssuer::new(tokens.clone(), codec.clone(), clock.clone());
        let refresh = RefreshCoordinator::new(
            accounts.clone(),
            tokens.clone(),
            codec,
            clock,
            issuer.clone(),
            reuse_policy,
        );
        let gate = ActivationGate::new(accounts.clone(), tokens, verifier, issuer);
        let registration = Registration::new(accounts, hasher);

        Self {
            gate,
            refresh,
            registration,
        }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<TokenPair> {
        self.gate.authenticate(email, password).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedSession> {
        self.refresh.refresh(refresh_token).await
    }

    pub async fn activate(&self, account_id: Uuid) -> Result<()> {
        self.gate.activate(account_id).await
    }

    pub async fn delete_activate_account_tokens(&self, records: &[TokenRecord]) -> Result<()> {
        self.gate.delete_activate_account_tokens(records).await
    }

    pub async fn register(&self, registration: NewRegistration) -> Result<Account> {
        self.registration.register(registration).await
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.refresh.revoke(refresh_token).await
    }

    pub async fn revoke_all(&self, account_id: Uuid) -> Result<u64> {
        self.refresh.revoke_all(account_id).await
    }

    pub fn reuse_policy(&self) -> ReusePolicy {
        self.refresh.policy()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{codec, fast_hasher, start_time};
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::{InMemoryAccountRepository, InMemoryTokenStore};
    use crate::error::SessionError;

    #[tokio::test]
    async fn test_register_activate_login_refresh_logout() {
        let tokens = Arc::new(InMemoryTokenStore::new());
        let service = SessionService::new(
            SessionDeps {
                accounts: Arc::new(InMemoryAccountRepository::new()),
                tokens: tokens.clone(),
                clock: Arc::new(ManualClock::new(start_time())),
                hasher: Arc::new(fast_hasher()),
                codec: Arc::new(codec()),
            },
            ReusePolicy::default(),
        );

        let account = service
            .register(NewRegistration {
                name: "Ada Lovelace".to_string(),
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "Qx7!vR2#mL9$tW".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service
                .authenticate("ada@example.com", "Qx7!vR2#mL9$tW")
                .await,
            Err(SessionError::NotActivated)
        ));

        service.activate(account.id).await.unwrap();
        let pair = service
            .authenticate("ada@example.com", "Qx7!vR2#mL9$tW")
            .await
            .unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refreshed.account.id, account.id);

        service.logout(&refreshed.refresh_token).await.unwrap();
        assert!(tokens.is_empty().await);
        assert_eq!(service.reuse_policy(), ReusePolicy::RejectOnly);
    }
}
