//! Configuration management for Session Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use session_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("JWT issuer: {}", settings.jwt.issuer);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::security::JwtConfig;
use crate::services::ReusePolicy;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub session: SessionSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            session: SessionSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Token signing settings; one secret per token class
#[derive(Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let access_secret =
            env::var("JWT_ACCESS_SECRET").context("JWT_ACCESS_SECRET must be set")?;
        let refresh_secret =
            env::var("JWT_REFRESH_SECRET").context("JWT_REFRESH_SECRET must be set")?;

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "session-service".to_string());

        let access_ttl_minutes: i64 = env::var("JWT_ACCESS_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("Invalid JWT_ACCESS_TTL_MINUTES")?;
        if access_ttl_minutes <= 0 {
            return Err(anyhow!("JWT_ACCESS_TTL_MINUTES must be positive"));
        }

        let refresh_ttl_days: i64 = env::var("JWT_REFRESH_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("Invalid JWT_REFRESH_TTL_DAYS")?;
        if refresh_ttl_days <= 0 {
            return Err(anyhow!("JWT_REFRESH_TTL_DAYS must be positive"));
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            issuer,
            access_ttl_minutes,
            refresh_ttl_days,
        })
    }

    /// Codec configuration; secret length and distinctness are checked by the codec
    pub fn codec_config(&self) -> JwtConfig {
        JwtConfig {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            issuer: self.issuer.clone(),
            access_ttl: ChronoDuration::minutes(self.access_ttl_minutes),
            refresh_ttl: ChronoDuration::days(self.refresh_ttl_days),
        }
    }
}

/// Refresh-token policy and housekeeping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub reuse_policy: ReusePolicy,
    pub reaper_interval_secs: u64,
}

impl SessionSettings {
    fn from_env() -> Result<Self> {
        let reuse_policy = env::var("SESSION_REUSE_POLICY")
            .unwrap_or_else(|_| ReusePolicy::default().as_str().to_string())
            .parse::<ReusePolicy>()
            .map_err(|e| anyhow!(e))
            .context("Invalid SESSION_REUSE_POLICY")?;

        let reaper_interval_secs = env::var("SESSION_REAPER_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("Invalid SESSION_REAPER_INTERVAL_SECS")?;

        Ok(Self {
            reuse_policy,
            reaper_interval_secs,
        })
    }

    /// Zero disables the reaper
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }
}
