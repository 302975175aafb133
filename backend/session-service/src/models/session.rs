use serde::{Deserialize, Serialize};

use super::account::AccountProjection;

/// Access/refresh token pair handed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub account: AccountProjection,
}
