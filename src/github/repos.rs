use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::Repository;

#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    full_name: String,
    owner: ApiOwner,
    #[serde(default)]
    private: bool,
    default_branch: Option<String>,
    #[serde(default)]
    stargazers_count: u32,
    #[serde(default)]
    forks_count: u32,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiOrg {
    login: String,
}

impl From<ApiRepo> for Repository {
    fn from(r: ApiRepo) -> Self {
        Repository {
            name: r.name,
            full_name: r.full_name,
            owner: r.owner.login,
            private: r.private,
            default_branch: r.default_branch,
            stars: r.stargazers_count,
            forks: r.forks_count,
            updated_at: r.updated_at,
        }
    }
}

impl GitHubClient {
    /// Repositories of the authenticated identity, most recently updated
    /// first, followed by any organization repositories not already listed.
    pub async fn list_repositories(&self, token: &str) -> Result<Vec<Repository>> {
        let own: Vec<ApiRepo> = self
            .paginate(
                token,
                "/user/repos",
                &[
                    ("sort", "updated".to_string()),
                    ("affiliation", "owner,collaborator,organization_member".to_string()),
                ],
            )
            .await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut repos: Vec<Repository> = Vec::with_capacity(own.len());
        for repo in own {
            if seen.insert(repo.full_name.clone()) {
                repos.push(repo.into());
            }
        }

        // Organization enumeration is best effort
        let orgs: Vec<ApiOrg> = match self.paginate(token, "/user/orgs", &[]).await {
            Ok(orgs) => orgs,
            Err(e) => {
                warn!(error = %e, "skipping organization repositories");
                Vec::new()
            }
        };
        for org in orgs {
            let path = format!("/orgs/{}/repos", org.login);
            match self.paginate::<ApiRepo>(token, &path, &[("sort", "updated".to_string())]).await {
                Ok(org_repos) => {
                    for repo in org_repos {
                        if seen.insert(repo.full_name.clone()) {
                            repos.push(repo.into());
                        }
                    }
                }
                Err(e) => warn!(org = %org.login, error = %e, "skipping organization"),
            }
        }

        info!(count = repos.len(), "listed repositories");
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn repo(full_name: &str) -> serde_json::Value {
        let (owner, name) = full_name.split_once('/').unwrap();
        json!({
            "name": name,
            "full_name": full_name,
            "owner": { "login": owner },
            "private": false,
            "default_branch": "main",
            "stargazers_count": 3,
            "forks_count": 1,
            "updated_at": "2024-01-14T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn merges_org_repos_without_duplicates() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/user/repos"))
                .respond_with(json_encoded(json!([repo("me/app"), repo("acme/api")]))),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/user/orgs"))
                .respond_with(json_encoded(json!([{ "login": "acme" }]))),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/orgs/acme/repos"))
                .respond_with(json_encoded(json!([repo("acme/api"), repo("acme/web")]))),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let repos = client.list_repositories("t").await.unwrap();

        let names: Vec<_> = repos.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["me/app", "acme/api", "acme/web"]);
        assert_eq!(repos[0].stars, 3);
        assert_eq!(repos[0].owner, "me");
    }

    #[tokio::test]
    async fn org_failures_degrade_to_partial_results() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/user/repos"))
                .respond_with(json_encoded(json!([repo("me/app")]))),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/user/orgs")).respond_with(status_code(403)),
        );

        let client = GitHubClient::new(server.url_str(""), Duration::from_secs(5), 100, 10).unwrap();
        let repos = client.list_repositories("t").await.unwrap();
        assert_eq!(repos.len(), 1);
    }
}
