//! GitHub-facing DTOs.
//!
//! - `Repository`: One repository visible to the signed-in identity
//! - `Contributor`: Author with aggregated commit/line counts and share of commits
//! - `CommitSummary`: Normalized commit, also the analyzer's context unit
//! - `BlameRange`: Line range attributed to a commit by GitHub's blame
//! - `FileLocation`: Parts of a `github.com/.../blob/...` URL

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub private: bool,
    pub default_branch: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    pub username: String,
    pub avatar_url: Option<String>,
    pub commits: u32,
    pub additions: u64,
    pub deletions: u64,
    /// Share of all contributor commits, 0-100 with two decimals
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitSummary {
    pub sha: String,
    /// GitHub login when the commit email maps to an account, else the git author name
    pub author: String,
    pub author_avatar: Option<String>,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlameRange {
    pub starting_line: u32,
    pub ending_line: u32,
    /// GitHub's 1-10 recency bucket
    pub age: u32,
    pub commit_sha: String,
    pub commit_message: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub author_login: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Blame for one file at one revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBlame {
    pub path: String,
    /// Revision that actually resolved (after the `main` → `master` fallback)
    pub revision: String,
    pub ranges: Vec<BlameRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileLocation {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub file_path: String,
}
