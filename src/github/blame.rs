//! File blame via GitHub's GraphQL API.
//!
//! The REST API has no blame endpoint, so ranges come from `Commit.blame`
//! on the commit the revision resolves to. When no revision is given the
//! default branch is guessed as `main`, falling back to `master` once.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::github::client::check_status;
use crate::github::GitHubClient;
use crate::models::{BlameRange, FileBlame};

const BLAME_QUERY: &str = r#"
query($owner: String!, $repo: String!, $rev: String!, $path: String!) {
  repository(owner: $owner, name: $repo) {
    object(expression: $rev) {
      ... on Commit {
        blame(path: $path) {
          ranges {
            startingLine
            endingLine
            age
            commit {
              oid
              message
              committedDate
              author {
                name
                email
                date
                user { login }
              }
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    repository: Option<GqlRepository>,
}

#[derive(Debug, Deserialize)]
struct GqlRepository {
    object: Option<GqlObject>,
}

#[derive(Debug, Deserialize)]
struct GqlObject {
    /// Absent when the revision resolves to something other than a commit
    blame: Option<GqlBlame>,
}

#[derive(Debug, Deserialize)]
struct GqlBlame {
    ranges: Vec<GqlRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlRange {
    starting_line: u32,
    ending_line: u32,
    age: u32,
    commit: GqlCommit,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlCommit {
    oid: String,
    message: String,
    committed_date: Option<DateTime<Utc>>,
    author: Option<GqlAuthor>,
}

#[derive(Debug, Deserialize)]
struct GqlAuthor {
    name: Option<String>,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
    user: Option<GqlUser>,
}

#[derive(Debug, Deserialize)]
struct GqlUser {
    login: String,
}

impl From<GqlRange> for BlameRange {
    fn from(r: GqlRange) -> Self {
        let author = r.commit.author;
        BlameRange {
            starting_line: r.starting_line,
            ending_line: r.ending_line,
            age: r.age,
            commit_sha: r.commit.oid,
            commit_message: r.commit.message.trim().to_string(),
            author_name: author
                .as_ref()
                .and_then(|a| a.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            author_email: author.as_ref().and_then(|a| a.email.clone()),
            author_login: author.as_ref().and_then(|a| a.user.as_ref().map(|u| u.login.clone())),
            date: author.and_then(|a| a.date).or(r.commit.committed_date),
        }
    }
}

impl GitHubClient {
    pub async fn get_blame(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        revision: Option<&str>,
    ) -> Result<FileBlame> {
        let candidates: Vec<&str> = match revision {
            Some(rev) => vec![rev],
            None => vec!["main", "master"],
        };

        for rev in candidates {
            if let Some(ranges) = self.blame_at(token, owner, repo, path, rev).await? {
                info!(owner, repo, path, rev, ranges = ranges.len(), "fetched blame");
                return Ok(FileBlame {
                    path: path.to_string(),
                    revision: rev.to_string(),
                    ranges,
                });
            }
            debug!(owner, repo, path, rev, "no file at revision");
        }

        Err(AppError::NotFound(format!("{} in {}/{}", path, owner, repo)))
    }

    /// `None` when `rev` does not resolve to a commit.
    async fn blame_at(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        rev: &str,
    ) -> Result<Option<Vec<BlameRange>>> {
        let body = json!({
            "query": BLAME_QUERY,
            "variables": {
                "owner": owner,
                "repo": repo,
                "rev": rev,
                "path": path,
            }
        });

        let resp = self
            .request(reqwest::Method::POST, "/graphql", token)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp, "/graphql").await?;
        let parsed: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Unexpected GraphQL payload: {}", e)))?;

        if let Some(err) = parsed.errors.first() {
            return match err.kind.as_deref() {
                Some("NOT_FOUND") => Err(AppError::NotFound(format!("{}/{}", owner, repo))),
                Some("FORBIDDEN") => Err(AppError::Forbidden(err.message.clone())),
                _ => Err(AppError::UpstreamError(err.message.clone())),
            };
        }

        let object = parsed.data.and_then(|d| d.repository).and_then(|r| r.object);
        Ok(object
            .and_then(|o| o.blame)
            .map(|b| b.ranges.into_iter().map(BlameRange::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn request_body(rev: &str) -> serde_json::Value {
        json!({
            "query": BLAME_QUERY,
            "variables": { "owner": "acme", "repo": "shop", "rev": rev, "path": "src/app.ts" }
        })
    }

    fn blame_payload() -> serde_json::Value {
        json!({
            "data": { "repository": { "object": { "blame": { "ranges": [{
                "startingLine": 1,
                "endingLine": 12,
                "age": 2,
                "commit": {
                    "oid": "abc123",
                    "message": "refactor payment\n",
                    "committedDate": "2024-01-14T09:30:00Z",
                    "author": { "name": "Alice", "email": "a@x.io", "date": "2024-01-14T09:00:00Z", "user": { "login": "alice" } }
                }
            }]}}}}
        })
    }

    #[tokio::test]
    async fn falls_back_to_master_once() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(json_decoded(eq(request_body("main")))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({ "data": { "repository": { "object": null } } }))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(json_decoded(eq(request_body("master")))),
            ])
            .times(1)
            .respond_with(json_encoded(blame_payload())),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let blame = client.get_blame("t", "acme", "shop", "src/app.ts", None).await.unwrap();

        assert_eq!(blame.revision, "master");
        assert_eq!(blame.ranges.len(), 1);
        assert_eq!(blame.ranges[0].author_login.as_deref(), Some("alice"));
        assert_eq!(blame.ranges[0].commit_message, "refactor payment");
    }

    #[tokio::test]
    async fn asks_the_commit_for_blame_by_path() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(matches(r"\.\.\. on Commit")),
                request::body(matches(r"blame\(path: \$path\)")),
                request::body(json_decoded(eq(json!({
                    "query": BLAME_QUERY,
                    "variables": { "owner": "acme", "repo": "shop", "rev": "v1.2", "path": "lib/pay.rs" }
                })))),
            ])
            .times(1)
            .respond_with(json_encoded(blame_payload())),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let blame = client.get_blame("t", "acme", "shop", "lib/pay.rs", Some("v1.2")).await.unwrap();

        assert_eq!(blame.revision, "v1.2");
        assert_eq!(blame.ranges[0].starting_line, 1);
        assert_eq!(blame.ranges[0].ending_line, 12);
        assert_eq!(blame.ranges[0].commit_sha, "abc123");
    }

    #[test]
    fn query_targets_commit_blame() {
        assert!(BLAME_QUERY.contains("... on Commit"));
        assert!(BLAME_QUERY.contains("blame(path: $path)"));
        assert!(!BLAME_QUERY.contains("on Blob"));
    }

    #[tokio::test]
    async fn explicit_revision_does_not_fall_back() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/graphql"))
                .times(1)
                .respond_with(json_encoded(json!({ "data": { "repository": { "object": null } } }))),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let err = client
            .get_blame("t", "acme", "shop", "src/app.ts", Some("feature"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn graphql_not_found_maps_to_not_found() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/graphql")).respond_with(json_encoded(json!({
                "data": { "repository": null },
                "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a Repository" }]
            }))),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let err = client.get_blame("t", "acme", "nope", "a.rs", Some("main")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
