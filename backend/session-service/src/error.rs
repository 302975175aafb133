use crypto_core::JwtError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Unknown email and wrong password collapse into this one variant
    #[error("Email or password incorrect")]
    InvalidCredentials,

    #[error("User not activated")]
    NotActivated,

    #[error("Refresh token expired or signature invalid")]
    ExpiredOrInvalidSignature,

    /// Consumed, never issued, or orphaned refresh token
    #[error("Refresh token reused or unknown")]
    ReuseOrUnknownToken,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Invalid username")]
    InvalidUsername,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl SessionError {
    /// True for the authentication-class failures (credential, activation, token)
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidCredentials
                | SessionError::NotActivated
                | SessionError::ExpiredOrInvalidSignature
                | SessionError::ReuseOrUnknownToken
        )
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        SessionError::Storage(err.to_string())
    }
}

impl From<JwtError> for SessionError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken(_) | JwtError::Expired | JwtError::WrongClass => {
                SessionError::ExpiredOrInvalidSignature
            }
            JwtError::Config(msg) | JwtError::Signing(msg) => {
                tracing::error!("JWT error: {}", msg);
                SessionError::Internal(msg)
            }
        }
    }
}

impl From<tokio::task::JoinError> for SessionError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {}", err);
        SessionError::Internal(format!("blocking task failed: {}", err))
    }
}
