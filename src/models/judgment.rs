//! Judgment DTOs.
//!
//! A Judgment moves `pending` → `completed` once suspects are computed, or
//! `pending` → `failed` when analysis fails. Suspects are returned ordered by
//! responsibility, highest first.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JudgmentStatus {
    Pending,
    Completed,
    Failed,
}

impl JudgmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgmentStatus::Pending => "pending",
            JudgmentStatus::Completed => "completed",
            JudgmentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JudgmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JudgmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JudgmentStatus::Pending),
            "completed" => Ok(JudgmentStatus::Completed),
            "failed" => Ok(JudgmentStatus::Failed),
            other => Err(format!("unknown judgment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJudgmentRequest {
    /// `owner/repo`
    pub repo_name: String,
    pub title: String,
    pub description: String,
    pub file_path: String,
    /// Commit window in days; falls back to full history when empty
    pub since_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuspectResponse {
    pub username: String,
    pub avatar_url: Option<String>,
    pub responsibility: u8,
    pub reason: String,
    pub last_commit_msg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentResponse {
    pub id: String,
    pub repo_name: String,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub status: JudgmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub suspects: Vec<SuspectResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentSummary {
    pub id: String,
    pub repo_name: String,
    pub title: String,
    pub status: JudgmentStatus,
    pub created_at: DateTime<Utc>,
}
