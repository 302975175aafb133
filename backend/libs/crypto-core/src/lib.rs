//! Cryptographic primitives shared by the session services
//!
//! - `jwt`: access/refresh token signing and verification
//! - `hash`: SHA-256 digests and log-safe token fingerprints

pub mod hash;
pub mod jwt;

pub use hash::{sha256, token_fingerprint};
pub use jwt::{Claims, JwtCodec, JwtConfig, JwtError, SignedToken, TokenClass};
