use std::collections::HashMap;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::Contributor;

#[derive(Debug, Deserialize)]
struct ApiContributor {
    login: Option<String>,
    /// Present on anonymous contributors
    name: Option<String>,
    avatar_url: Option<String>,
    contributions: u32,
}

#[derive(Debug, Deserialize)]
struct ApiContributorStats {
    author: Option<ApiOwner>,
    #[serde(default)]
    weeks: Vec<ApiWeek>,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiWeek {
    #[serde(default)]
    a: u64,
    #[serde(default)]
    d: u64,
}

impl GitHubClient {
    /// Contributors with their commit share; line counts come from the
    /// statistics endpoint when GitHub has them ready.
    pub async fn list_contributors(&self, token: &str, owner: &str, repo: &str) -> Result<Vec<Contributor>> {
        let path = format!("/repos/{}/{}/contributors", owner, repo);
        let raw: Vec<ApiContributor> = self.paginate(token, &path, &[("anon", "1".to_string())]).await?;

        let line_stats = self.contributor_line_stats(token, owner, repo).await;

        let mut contributors: Vec<Contributor> = raw
            .into_iter()
            .filter_map(|c| {
                let username = c.login.or(c.name)?;
                let (additions, deletions) = line_stats.get(&username).copied().unwrap_or((0, 0));
                Some(Contributor {
                    username,
                    avatar_url: c.avatar_url,
                    commits: c.contributions,
                    additions,
                    deletions,
                    percentage: 0.0,
                })
            })
            .collect();

        apply_percentages(&mut contributors);
        contributors.sort_by(|a, b| b.commits.cmp(&a.commits));
        Ok(contributors)
    }

    /// Best effort: login -> (additions, deletions). Empty while GitHub is
    /// still computing (202) or on any failure.
    async fn contributor_line_stats(&self, token: &str, owner: &str, repo: &str) -> HashMap<String, (u64, u64)> {
        let path = format!("/repos/{}/{}/stats/contributors", owner, repo);
        let resp = match self.get(token, &path, &[]).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "contributor statistics unavailable");
                return HashMap::new();
            }
        };
        if resp.status() == StatusCode::ACCEPTED {
            debug!(owner, repo, "contributor statistics still computing");
            return HashMap::new();
        }

        match resp.json::<Vec<ApiContributorStats>>().await {
            Ok(stats) => stats
                .into_iter()
                .filter_map(|s| {
                    let login = s.author?.login;
                    let totals = s
                        .weeks
                        .iter()
                        .fold((0u64, 0u64), |(a, d), w| (a + w.a, d + w.d));
                    Some((login, totals))
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "unexpected contributor statistics payload");
                HashMap::new()
            }
        }
    }
}

/// Commit share per contributor, rounded to two decimals; all zero when
/// nobody has commits.
pub fn apply_percentages(contributors: &mut [Contributor]) {
    let total: u64 = contributors.iter().map(|c| c.commits as u64).sum();
    for c in contributors.iter_mut() {
        c.percentage = if total == 0 {
            0.0
        } else {
            round2(c.commits as f64 * 100.0 / total as f64)
        };
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
