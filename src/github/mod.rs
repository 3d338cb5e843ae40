//! GitHub Data Gateway.
//!
//! `GitHubClient` is split by feature area, mirroring the API surface:
//! - `client`: transport, status mapping, bounded pagination
//! - `repos`: repositories of the signed-in identity
//! - `contributors`: contributors with commit share and line stats
//! - `commits`: commit listings filtered by path/date
//! - `blame`: per-file blame ranges (GraphQL)
//! - `user`: the authenticated account
//! - `location`: parsing `github.com/.../blob/...` links and `owner/repo` names

pub mod blame;
pub mod client;
pub mod commits;
pub mod contributors;
pub mod location;
pub mod repos;
pub mod user;

pub use client::GitHubClient;
pub use commits::CommitFilter;
