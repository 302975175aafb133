/// Process-wide resources with an explicit lifecycle
///
/// `AppContext::init` builds the pool, runs migrations, wires the adapters
/// into a `SessionService`, and starts the reaper. `shutdown` undoes it.
use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::db::{PgAccountRepository, PgTokenStore, TokenStore};
use crate::security::{Argon2Hasher, JwtCodec};
use crate::services::{spawn_token_reaper, SessionDeps, SessionService};

pub struct AppContext {
    pool: PgPool,
    sessions: SessionService,
    reaper: Option<JoinHandle<()>>,
}

impl AppContext {
    pub async fn init(settings: &Settings) -> Result<Self> {
        let codec = JwtCodec::new(settings.jwt.codec_config())
            .context("Invalid JWT configuration")?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.database.max_connections)
            .min_connections(settings.database.min_connections)
            .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
            .connect(&settings.database.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!(
            "Database pool initialized with {} max connections",
            settings.database.max_connections
        );

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed");

        let tokens: Arc<dyn TokenStore> = Arc::new(PgTokenStore::new(pool.clone()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let sessions = SessionService::new(
            SessionDeps {
                accounts: Arc::new(PgAccountRepository::new(pool.clone())),
                tokens: tokens.clone(),
                clock: clock.clone(),
                hasher: Arc::new(Argon2Hasher::new()),
                codec: Arc::new(codec),
            },
            settings.session.reuse_policy,
        );
        info!(reuse_policy = %settings.session.reuse_policy, "Session service initialized");

        let reaper = spawn_token_reaper(tokens, clock, settings.session.reaper_interval());

        Ok(Self {
            pool,
            sessions,
            reaper,
        })
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Stop background work and close the pool
    pub async fn shutdown(mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
            let _ = reaper.await;
            info!("Token reaper stopped");
        }

        self.pool.close().await;
        info!("Database pool closed");
    }
}
