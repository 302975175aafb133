/// Data models for account sessions
pub mod account;
pub mod session;
pub mod token;

pub use account::{Account, AccountProjection, NewAccount};
pub use session::{RefreshedSession, TokenPair};
pub use token::{NewTokenRecord, TokenKind, TokenRecord};
