use serde::Deserialize;

use crate::error::Result;
use crate::github::GitHubClient;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
}

impl GitHubClient {
    pub async fn current_user(&self, token: &str) -> Result<GitHubUser> {
        self.get_json(token, "/user", &[]).await
    }
}
