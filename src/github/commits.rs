use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::CommitSummary;

/// Optional narrowing for commit listings.
#[derive(Debug, Clone, Default)]
pub struct CommitFilter {
    /// Branch, tag or SHA to list from; the default branch when unset
    pub sha: Option<String>,
    pub path: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl CommitFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(sha) = &self.sha {
            query.push(("sha", sha.clone()));
        }
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            query.push(("path", path.to_string()));
        }
        if let Some(since) = self.since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(until) = self.until {
            query.push(("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        query
    }
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitBody,
    /// Null when the commit email maps to no GitHub account
    author: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitBody {
    message: String,
    author: Option<ApiGitAuthor>,
}

#[derive(Debug, Deserialize)]
struct ApiGitAuthor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
    avatar_url: Option<String>,
}

impl From<ApiCommit> for CommitSummary {
    fn from(c: ApiCommit) -> Self {
        let git_author = c.commit.author;
        let date = git_author.as_ref().and_then(|a| a.date).unwrap_or_default();
        let (author, author_avatar) = match c.author {
            Some(user) => (user.login, user.avatar_url),
            None => (
                git_author
                    .and_then(|a| a.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                None,
            ),
        };
        CommitSummary {
            sha: c.sha,
            author,
            author_avatar,
            message: c.commit.message.trim().to_string(),
            date,
            diff_size: None,
        }
    }
}

impl GitHubClient {
    /// Commits newest first, bounded by the pagination limit.
    pub async fn list_commits(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        filter: &CommitFilter,
    ) -> Result<Vec<CommitSummary>> {
        let path = format!("/repos/{}/{}/commits", owner, repo);
        let raw: Vec<ApiCommit> = self.paginate(token, &path, &filter.to_query()).await?;
        debug!(owner, repo, count = raw.len(), "fetched commits");
        Ok(raw.into_iter().map(CommitSummary::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    #[tokio::test]
    async fn forwards_filters_and_normalizes_authors() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/repos/acme/shop/commits"),
                request::query(url_decoded(contains(("path", "src/api/payment.ts")))),
                request::query(url_decoded(contains(("since", "2024-01-01T00:00:00Z")))),
            ])
            .respond_with(json_encoded(json!([
                {
                    "sha": "aaa111",
                    "commit": { "message": "refactor payment\n\nbody", "author": { "name": "Alice", "date": "2024-01-14T09:00:00Z" } },
                    "author": { "login": "alice", "avatar_url": "https://a/alice" }
                },
                {
                    "sha": "bbb222",
                    "commit": { "message": "fix typo", "author": { "name": "Bob Unlinked", "date": "2023-12-20T09:00:00Z" } },
                    "author": null
                }
            ]))),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let filter = CommitFilter {
            path: Some("src/api/payment.ts".to_string()),
            since: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..CommitFilter::default()
        };
        let commits = client.list_commits("t", "acme", "shop", &filter).await.unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author, "alice");
        assert_eq!(commits[0].author_avatar.as_deref(), Some("https://a/alice"));
        assert_eq!(commits[0].message, "refactor payment\n\nbody");
        assert_eq!(commits[1].author, "Bob Unlinked");
        assert_eq!(commits[1].author_avatar, None);
    }
}
