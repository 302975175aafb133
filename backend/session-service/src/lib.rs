/// Session Service Library
///
/// Account session management: credential checks, access/refresh token
/// issuance, refresh-token rotation, and activation gating.
///
/// ## Modules
///
/// - `clock`: Injected time source
/// - `config`: Service configuration
/// - `context`: Process-wide resources with an explicit lifecycle
/// - `db`: Storage ports and their PostgreSQL / in-memory adapters
/// - `error`: Error types
/// - `models`: Data models
/// - `security`: Password hashing, token codec re-exports
/// - `services`: Session business logic and the `SessionService` facade
/// - `status`: Error-to-status mapping for the outer boundary
/// - `validators`: Input validation
pub mod clock;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;
pub mod status;
pub mod validators;

// Re-export commonly used types
pub use error::{Result, SessionError};
pub use services::{SessionDeps, SessionService};
