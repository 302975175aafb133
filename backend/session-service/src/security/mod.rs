/// Security primitives for the session core
///
/// - **password**: Argon2id hashing behind the `PasswordHasher` port,
///   plus registration-time strength checks
/// - **crypto-core**: signed-token codec and token fingerprints (re-exported)
pub use crypto_core::{token_fingerprint, Claims, JwtCodec, JwtConfig, SignedToken, TokenClass};

pub mod password;

pub use password::{validate_password_strength, Argon2Hasher, PasswordHasher};
