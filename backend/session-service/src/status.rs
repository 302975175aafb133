/// Transport mapping for session errors
///
/// The core returns `SessionError`; whichever transport sits on top (HTTP
/// controller, gRPC handler) converts it through `ErrorResponse` so that every
/// surface reports the same status and the same non-distinguishing message.
use crate::error::SessionError;
use http::StatusCode;
use serde::Serialize;

/// Message shared by both refresh-token failures
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub message: String,
}

/// Serialized body: `{"error": "...", "status": 401}`
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub status: u16,
}

impl ErrorResponse {
    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            error: &self.message,
            status: self.status.as_u16(),
        }
    }
}

impl From<&SessionError> for ErrorResponse {
    fn from(err: &SessionError) -> Self {
        let (status, message) = match err {
            SessionError::InvalidCredentials | SessionError::NotActivated => {
                (StatusCode::UNAUTHORIZED, err.to_string())
            }
            SessionError::ExpiredOrInvalidSignature | SessionError::ReuseOrUnknownToken => {
                (StatusCode::UNAUTHORIZED, INVALID_REFRESH_TOKEN.to_string())
            }
            SessionError::AccountNotFound => (StatusCode::NOT_FOUND, err.to_string()),
            SessionError::EmailAlreadyExists | SessionError::UsernameAlreadyExists => {
                (StatusCode::CONFLICT, err.to_string())
            }
            SessionError::InvalidEmail
            | SessionError::InvalidUsername
            | SessionError::WeakPassword(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            // Don't leak internal details
            SessionError::Storage(_) | SessionError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        Self { status, message }
    }
}

impl From<SessionError> for ErrorResponse {
    fn from(err: SessionError) -> Self {
        ErrorResponse::from(&err)
    }
}
