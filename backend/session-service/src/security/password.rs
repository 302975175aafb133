/// Password hashing and verification using Argon2id
use crate::error::{Result, SessionError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use zxcvbn::zxcvbn;

/// One-way password hashing port
///
/// Both operations are CPU-bound and synchronous; async callers run them
/// through `tokio::task::spawn_blocking`.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; `Err` only for malformed stored hashes
    fn compare(&self, plaintext: &str, hash: &str) -> Result<bool>;
}

/// Argon2id with default parameters and a random 16-byte salt per hash
#[derive(Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit memory (KiB), iteration and lane costs
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| SessionError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2Hasher {
    /// Returns a PHC-formatted hash string safe for database storage
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| SessionError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    fn compare(&self, plaintext: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| SessionError::Internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(SessionError::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }
}

/// Validate password strength using composition rules and zxcvbn
///
/// ## Requirements
///
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
/// - At least one special character
/// - zxcvbn entropy score >= 3 (strong)
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(SessionError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    if !has_uppercase {
        return Err(SessionError::WeakPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !has_lowercase {
        return Err(SessionError::WeakPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !has_digit {
        return Err(SessionError::WeakPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }

    if !has_special {
        return Err(SessionError::WeakPassword(
            "Password must contain at least one special character".to_string(),
        ));
    }

    let entropy = zxcvbn(password, &[]).map_err(|e| {
        SessionError::Internal(format!("Password entropy calculation failed: {}", e))
    })?;

    if entropy.score() < 3 {
        return Err(SessionError::WeakPassword(
            "Password is too weak. Please use a stronger password with higher entropy.".to_string(),
        ));
    }

    Ok(())
}
