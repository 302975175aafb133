//! Shared harness for the session integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use session_service::clock::ManualClock;
use session_service::db::{InMemoryAccountRepository, InMemoryTokenStore};
use session_service::models::Account;
use session_service::security::{Argon2Hasher, JwtCodec, JwtConfig, PasswordHasher};
use session_service::services::{ReusePolicy, SessionDeps, SessionService};
use uuid::Uuid;

pub const PASSWORD: &str = "Qx7!vR2#mL9$tW";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn codec() -> JwtCodec {
    JwtCodec::new(JwtConfig {
        access_secret: "integration-access-secret-0123456789abcdef".to_string(),
        refresh_secret: "integration-refresh-secret-0123456789abcdef".to_string(),
        issuer: "session-service-test".to_string(),
        access_ttl: Duration::minutes(15),
        refresh_ttl: Duration::days(30),
    })
    .expect("test codec config is valid")
}

pub struct Harness {
    pub accounts: Arc<InMemoryAccountRepository>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub clock: Arc<ManualClock>,
    pub hasher: Arc<Argon2Hasher>,
    pub codec: Arc<JwtCodec>,
    pub service: SessionService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(ReusePolicy::RejectOnly)
    }

    pub fn with_policy(policy: ReusePolicy) -> Self {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let tokens = Arc::new(InMemoryTokenStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        // Cheap parameters keep debug-build tests fast
        let hasher = Arc::new(Argon2Hasher::with_params(1024, 1, 1).expect("valid params"));
        let codec = Arc::new(codec());

        let service = SessionService::new(
            SessionDeps {
                accounts: accounts.clone(),
                tokens: tokens.clone(),
                clock: clock.clone(),
                hasher: hasher.clone(),
                codec: codec.clone(),
            },
            policy,
        );

        Self {
            accounts,
            tokens,
            clock,
            hasher,
            codec,
            service,
        }
    }

    /// Seed an account whose password is `PASSWORD`
    pub async fn seed_account(&self, email: &str, activated: bool) -> Account {
        let local = email.split('@').next().unwrap_or("user");
        let account = Account {
            id: Uuid::new_v4(),
            name: format!("{local} Example"),
            username: local.to_string(),
            email: email.to_string(),
            password_hash: self.hasher.hash(PASSWORD).expect("hash test password"),
            profile_picture: Some(format!("https://cdn.example.com/{local}.png")),
            activated,
            created_at: self.clock_now(),
            updated_at: self.clock_now(),
        };
        self.accounts.insert(account.clone()).await;
        account
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use session_service::clock::Clock;
        self.clock.now()
    }
}
