use sha2::{Digest, Sha256};

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Short, log-safe fingerprint of a secret token
///
/// First 12 hex characters of the SHA-256 digest: enough to correlate log
/// lines for the same token without revealing anything replayable.
pub fn token_fingerprint(token: &str) -> String {
    let digest = hex::encode(sha256(token.as_bytes()));
    digest[..12].to_string()
}
