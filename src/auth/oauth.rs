use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Profile and private repository access.
pub const OAUTH_SCOPE: &str = "read:user,repo";

/// GitHub OAuth web flow.
#[derive(Debug, Clone)]
pub struct GitHubOAuth {
    oauth_url: String,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl GitHubOAuth {
    pub fn new(
        oauth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            oauth_url: oauth_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http,
        })
    }

    /// Where the browser is sent to grant access.
    pub fn authorize_url(&self) -> Result<String> {
        let mut url = url::Url::parse(&format!("{}/login/oauth/authorize", self.oauth_url))
            .map_err(|e| AppError::Internal(format!("Invalid OAuth URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", OAUTH_SCOPE);
        Ok(url.into())
    }

    /// Trades a one-time authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(ACCEPT, "application/json")
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "token exchange rejected");
            return Err(AppError::from_upstream_status(status.as_u16(), "GitHub token exchange"));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Unexpected token payload: {}", e)))?;

        match body.access_token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(token),
            None => {
                let detail = body.error_description.or(body.error).unwrap_or_default();
                warn!(detail = %detail, "GitHub returned no access token");
                let message = if detail.is_empty() {
                    "Failed to get access token".to_string()
                } else {
                    format!("Failed to get access token: {}", detail)
                };
                Err(AppError::BadRequest(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn oauth(server: &Server) -> GitHubOAuth {
        GitHubOAuth::new(server.url_str(""), "cid", "csecret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn authorize_url_carries_client_and_scope() {
        let o = GitHubOAuth::new("https://github.com", "cid", "s", Duration::from_secs(1)).unwrap();
        let url = url::Url::parse(&o.authorize_url().unwrap()).unwrap();
        assert_eq!(url.path(), "/login/oauth/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "cid".to_string())));
        assert!(pairs.contains(&("scope".to_string(), OAUTH_SCOPE.to_string())));
    }

    #[tokio::test]
    async fn exchanges_code_for_token() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/login/oauth/access_token"),
                request::headers(contains(("accept", "application/json"))),
                request::body(json_decoded(eq(json!({
                    "client_id": "cid",
                    "client_secret": "csecret",
                    "code": "abc"
                })))),
            ])
            .respond_with(json_encoded(json!({ "access_token": "gho_123", "token_type": "bearer" }))),
        );

        assert_eq!(oauth(&server).exchange_code("abc").await.unwrap(), "gho_123");
    }

    #[tokio::test]
    async fn missing_token_is_bad_request() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/login/oauth/access_token")).respond_with(
                json_encoded(json!({ "error": "bad_verification_code", "error_description": "The code passed is incorrect or expired." })),
            ),
        );

        let err = oauth(&server).exchange_code("stale").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
