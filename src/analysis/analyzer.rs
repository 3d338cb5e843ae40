//! Responsibility analyzer.
//!
//! Builds a deterministic prompt from the incident, its commit context and
//! the current blame of the file,
//! asks the model for a JSON verdict, validates the shape and normalizes
//! the percentages so that every returned verdict satisfies:
//! - 1 to 5 suspects
//! - responsibilities are integers summing to exactly 100
//! - ordered by responsibility, highest first, ties in first-seen order
//!
//! Transport failures are retried per `RetryPolicy`; a delivered but invalid
//! verdict is not.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::llm::{LlmProvider, LlmRequest, RetryPolicy};
use crate::models::{CommitSummary, FileBlame};

pub const MAX_SUSPECTS: usize = 5;
pub const MAX_CONTEXT_COMMITS: usize = 30;
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// The incident under investigation.
#[derive(Debug, Clone)]
pub struct Incident<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub file_path: &'a str,
    /// Current line ownership of `file_path`; empty when blame is unavailable
    pub blame: &'a [BlameShare],
}

/// Lines of the file currently attributed to one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameShare {
    pub author: String,
    pub lines: u32,
    /// Short SHA of the newest commit among the author's ranges
    pub last_commit: String,
}

/// Folds blame ranges into per-author line counts, most lines first; ties
/// keep the order authors first appear in the file.
pub fn blame_shares(blame: &FileBlame) -> Vec<BlameShare> {
    let mut shares: Vec<(BlameShare, Option<DateTime<Utc>>)> = Vec::new();
    for range in &blame.ranges {
        let author = range.author_login.as_deref().unwrap_or(&range.author_name);
        let lines = (range.ending_line + 1).saturating_sub(range.starting_line);
        match shares.iter_mut().find(|(s, _)| s.author == author) {
            Some((share, newest)) => {
                share.lines += lines;
                if range.date > *newest {
                    *newest = range.date;
                    share.last_commit = short_sha(&range.commit_sha).to_string();
                }
            }
            None => shares.push((
                BlameShare {
                    author: author.to_string(),
                    lines,
                    last_commit: short_sha(&range.commit_sha).to_string(),
                },
                range.date,
            )),
        }
    }
    let mut shares: Vec<BlameShare> = shares.into_iter().map(|(s, _)| s).collect();
    shares.sort_by(|a, b| b.lines.cmp(&a.lines));
    shares
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspectVerdict {
    pub username: String,
    pub responsibility: u8,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct VerdictPayload {
    suspects: Vec<RawSuspect>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSuspect {
    #[serde(alias = "author")]
    username: String,
    #[serde(alias = "percentage")]
    responsibility: u64,
    #[serde(default)]
    reason: String,
}

/// What the model sees for each commit.
#[derive(Serialize)]
struct CommitView<'a> {
    sha: &'a str,
    author: &'a str,
    message: &'a str,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_size: Option<u32>,
}

pub struct ResponsibilityAnalyzer {
    provider: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
}

impl ResponsibilityAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub async fn analyze(
        &self,
        incident: &Incident<'_>,
        commits: &[CommitSummary],
    ) -> Result<Vec<SuspectVerdict>> {
        let request = LlmRequest::json(build_prompt(incident, commits), MAX_OUTPUT_TOKENS);
        let provider = &self.provider;
        let request = &request;

        let raw = self
            .retry
            .run("analyze", move |attempt| {
                debug!(attempt, provider = provider.name(), "requesting responsibility verdict");
                provider.complete(request)
            })
            .await
            .map_err(|e| {
                AppError::AnalysisFailed(format!(
                    "{} (gave up after at most {} attempts)",
                    e,
                    self.retry.max_attempts()
                ))
            })?;

        let suspects = normalize(parse_verdict(&raw)?)?;
        info!(
            suspects = suspects.len(),
            top = %suspects[0].username,
            top_responsibility = suspects[0].responsibility,
            "responsibility verdict ready"
        );
        Ok(suspects)
    }
}

pub fn build_prompt(incident: &Incident<'_>, commits: &[CommitSummary]) -> String {
    let views: Vec<CommitView<'_>> = commits
        .iter()
        .take(MAX_CONTEXT_COMMITS)
        .map(|c| CommitView {
            sha: short_sha(&c.sha),
            author: &c.author,
            message: &c.message,
            date: c.date.to_rfc3339(),
            diff_size: c.diff_size,
        })
        .collect();
    // A Vec of plain structs always serializes
    let commit_json = serde_json::to_string_pretty(&views).unwrap_or_else(|_| "[]".to_string());
    let blame_section = if incident.blame.is_empty() {
        "unavailable".to_string()
    } else {
        let total: u32 = incident.blame.iter().map(|s| s.lines).sum();
        incident
            .blame
            .iter()
            .map(|s| format!("- {}: {} of {} lines (last commit {})", s.author, s.lines, total, s.last_commit))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You analyze Git commit history to decide who is responsible for a bug or outage.

[Incident]
Title: {title}
Error: {description}
File: {file_path}

[Commit history]
{commit_json}

[Current blame of {file_path}]
{blame_section}

Assign each developer a share of responsibility.

Criteria:
1. The last person to modify the file or feature carries the most responsibility
2. Authors of code related to the error, and who owns the most lines of the file now
3. More recent commits weigh more
4. Overlap between the commit message and the error (same file, function or feature)

Respond with JSON only, no other text, in exactly this shape:
{{
  "suspects": [
    {{
      "username": "developer login",
      "responsibility": <integer 0-100>,
      "reason": "why, in 1-2 sentences"
    }}
  ]
}}

Rules:
- responsibility values must sum to exactly 100
- between 1 and {max} suspects
- sorted by responsibility, highest first"#,
        title = incident.title,
        description = incident.description,
        file_path = incident.file_path,
        commit_json = commit_json,
        blame_section = blame_section,
        max = MAX_SUSPECTS,
    )
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Strips a surrounding markdown code fence, if any.
fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_verdict(raw: &str) -> Result<Vec<RawSuspect>> {
    let payload: VerdictPayload = serde_json::from_str(unfence(raw))
        .map_err(|e| AppError::MalformedModelOutput(e.to_string()))?;

    if payload.suspects.is_empty() {
        return Err(AppError::MalformedModelOutput("suspects list is empty".to_string()));
    }
    if payload.suspects.iter().any(|s| s.username.trim().is_empty()) {
        return Err(AppError::MalformedModelOutput("suspect without username".to_string()));
    }
    Ok(payload.suspects)
}

fn normalize(raw: Vec<RawSuspect>) -> Result<Vec<SuspectVerdict>> {
    // Merge repeated usernames, keeping the first position
    let mut merged: Vec<RawSuspect> = Vec::with_capacity(raw.len());
    for suspect in raw {
        let username = suspect.username.trim().to_string();
        match merged.iter_mut().find(|m| m.username == username) {
            Some(existing) => {
                existing.responsibility = existing.responsibility.saturating_add(suspect.responsibility);
                if existing.reason.is_empty() {
                    existing.reason = suspect.reason;
                }
            }
            None => merged.push(RawSuspect { username, ..suspect }),
        }
    }

    if merged.len() > MAX_SUSPECTS {
        return Err(AppError::InvariantViolation(format!(
            "{} suspects, at most {} allowed",
            merged.len(),
            MAX_SUSPECTS
        )));
    }
    if let Some(s) = merged.iter().find(|s| s.responsibility > 100) {
        return Err(AppError::InvariantViolation(format!(
            "{} has responsibility {}",
            s.username, s.responsibility
        )));
    }

    let total: u64 = merged.iter().map(|s| s.responsibility).sum();
    if total == 0 {
        return Err(AppError::InvariantViolation("responsibilities sum to 0".to_string()));
    }

    let mut shares: Vec<u64> = merged.iter().map(|s| s.responsibility).collect();
    if total != 100 {
        warn!(total, "rescaling responsibilities to 100");
        shares = merged.iter().map(|s| s.responsibility * 100 / total).collect();
        let remainder = 100 - shares.iter().sum::<u64>();
        let top = top_index(&merged);
        shares[top] += remainder;
    }

    let mut suspects: Vec<SuspectVerdict> = merged
        .into_iter()
        .zip(shares)
        .map(|(s, share)| SuspectVerdict {
            username: s.username,
            responsibility: share as u8,
            reason: s.reason,
        })
        .collect();
    // Stable: equal shares keep first-seen order
    suspects.sort_by(|a, b| b.responsibility.cmp(&a.responsibility));
    Ok(suspects)
}

/// Index of the highest responsibility, first one wins ties.
fn top_index(suspects: &[RawSuspect]) -> usize {
    let mut best = 0;
    for (i, s) in suspects.iter().enumerate() {
        if s.responsibility > suspects[best].responsibility {
            best = i;
        }
    }
    best
}
