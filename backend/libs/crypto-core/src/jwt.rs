/// Signed session tokens for the account-session service
///
/// Two token classes share one wire format (compact JWT) but never share a key:
///
/// - **access**: short-lived, stateless, carries only the subject
/// - **refresh**: long-lived, carries subject and email, persisted server-side
///
/// ## Security Design
///
/// - **HS256 with one secret per class**: an access token can never be replayed
///   as a refresh token (and vice versa) because the signature would not verify
/// - **Explicit key ownership**: keys live in a `JwtCodec` value built at startup
///   and passed to the services that need it
/// - **Caller-supplied time**: expiry is computed and checked against the `now`
///   passed in, so services can inject a clock
///
/// ## Usage
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use crypto_core::jwt::{JwtCodec, JwtConfig, TokenClass};
///
/// let codec = JwtCodec::new(JwtConfig {
///     access_secret: "a".repeat(32),
///     refresh_secret: "r".repeat(32),
///     issuer: "session-service".to_string(),
///     access_ttl: Duration::minutes(15),
///     refresh_ttl: Duration::days(30),
/// })
/// .unwrap();
///
/// let now = Utc::now();
/// let signed = codec.sign(TokenClass::Refresh, "user-1", Some("a@b.dev"), now).unwrap();
/// let claims = codec.verify(TokenClass::Refresh, &signed.token, now).unwrap();
/// assert_eq!(claims.sub, "user-1");
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// JWT algorithm for both token classes
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum secret length in bytes (256 bits for HS256)
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Invalid JWT configuration: {0}")]
    Config(String),

    #[error("Token signature or structure invalid: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Token class mismatch")]
    WrongClass,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

pub type JwtResult<T> = std::result::Result<T, JwtError>;

/// Token class, embedded as the `token_type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

/// JWT claims for both classes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Email address, refresh tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Random token ID; keeps two tokens minted in the same second distinct
    pub jti: String,
    pub token_type: TokenClass,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Codec construction parameters
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[derive(Clone)]
struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Signs and verifies access/refresh tokens
#[derive(Clone)]
pub struct JwtCodec {
    access: ClassKeys,
    refresh: ClassKeys,
    issuer: String,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    /// Build a codec from two secrets
    ///
    /// ## Errors
    ///
    /// Returns `JwtError::Config` if:
    /// - Either secret is shorter than `MIN_SECRET_BYTES`
    /// - Both classes use the same secret
    /// - Either validity window is not positive
    pub fn new(config: JwtConfig) -> JwtResult<Self> {
        for (name, secret) in [
            ("access", &config.access_secret),
            ("refresh", &config.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(JwtError::Config(format!(
                    "{name} secret must be at least {MIN_SECRET_BYTES} bytes"
                )));
            }
        }

        if config.access_secret == config.refresh_secret {
            return Err(JwtError::Config(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        if config.access_ttl <= Duration::zero() || config.refresh_ttl <= Duration::zero() {
            return Err(JwtError::Config(
                "token validity windows must be positive".to_string(),
            ));
        }

        Ok(Self {
            access: ClassKeys {
                encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
                ttl: config.access_ttl,
            },
            refresh: ClassKeys {
                encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
                ttl: config.refresh_ttl,
            },
            issuer: config.issuer,
        })
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Validity window of a token class
    pub fn ttl(&self, class: TokenClass) -> Duration {
        self.keys(class).ttl
    }

    /// Sign a token of the given class issued at `now`
    pub fn sign(
        &self,
        class: TokenClass,
        subject: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> JwtResult<SignedToken> {
        let keys = self.keys(class);
        let expires_at = now + keys.ttl;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: subject.to_string(),
            email: email.map(str::to_string),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: jti.clone(),
            token_type: class,
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &keys.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))?;

        Ok(SignedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Verify signature, issuer, class and expiry of a token
    ///
    /// Expiry is checked against `now` rather than the system clock; a token
    /// whose `exp` equals `now` is already expired.
    pub fn verify(&self, class: TokenClass, token: &str, now: DateTime<Utc>) -> JwtResult<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let data = decode::<Claims>(token, &self.keys(class).decoding, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        if claims.token_type != class {
            return Err(JwtError::WrongClass);
        }

        if claims.exp <= now.timestamp() {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}
