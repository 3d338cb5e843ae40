//! Data transfer objects (DTOs) for API requests and responses.
//!
//! These structs are serialized to JSON for frontend consumption.
//! - `auth`: UserResponse, LogoutResponse
//! - `github`: Repository, Contributor, CommitSummary, BlameRange, FileBlame, FileLocation
//! - `judgment`: JudgmentStatus, CreateJudgmentRequest, JudgmentResponse, JudgmentSummary, SuspectResponse
//! - `blame`: Intensity, BlameCreate, BlameVerdict, ImageResponse

pub mod auth;
pub mod blame;
pub mod github;
pub mod judgment;

pub use auth::*;
pub use blame::*;
pub use github::*;
pub use judgment::*;
