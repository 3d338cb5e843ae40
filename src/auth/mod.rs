//! Identity: GitHub OAuth sign-in and bearer session tokens.
//!
//! - `oauth`: authorize URL and code → access token exchange
//! - `jwt`: HS256 session tokens carrying the local user id
//! - `extractor`: `AuthUser`, resolves the bearer token to a stored user

pub mod extractor;
pub mod jwt;
pub mod oauth;

pub use extractor::AuthUser;
pub use jwt::{Claims, SessionKeys};
pub use oauth::GitHubOAuth;
