//! Authentication module
//!
//! Supports: static bearer tokens and OAuth2 client credentials.
//!
//! The `Authenticator` attaches `Authorization: Bearer <token>` to each
//! request and lazily refreshes OAuth2 tokens when they expire.

mod authenticator;
mod types;

pub use authenticator::{is_alphanumeric_token, Authenticator, NON_ALPHANUMERIC_TOKEN};
pub use types::{AuthConfig, CachedToken};
