use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, Result};

const API_VERSION: &str = "2022-11-28";

/// GitHub REST/GraphQL gateway.
///
/// Stateless apart from the connection pool; every call carries the
/// caller's OAuth token so one client serves all users.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    pub(crate) api_url: String,
    pub(crate) inner: reqwest::Client,
    pub(crate) per_page: u32,
    pub(crate) max_pages: u32,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration, per_page: u32, max_pages: u32) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            inner,
            per_page: per_page.clamp(1, 100),
            max_pages: max_pages.max(1),
        })
    }

    pub(crate) fn request(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.inner
            .request(method, format!("{}{}", self.api_url, path))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "gitblame")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// GET `path` and return the response if it is a 2xx.
    pub(crate) async fn get(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let resp = self
            .request(reqwest::Method::GET, path, token)
            .query(query)
            .send()
            .await?;
        check_status(resp, path).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self.get(token, path, query).await?;
        resp.json::<T>()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Unexpected GitHub payload from {}: {}", path, e)))
    }

    /// Fetches fixed-size pages until a short page or `max_pages`. A
    /// `204 No Content` (an empty repository) ends the listing.
    pub(crate) async fn paginate<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();

        for page in 1..=self.max_pages {
            let mut params = query.to_vec();
            params.push(("per_page", self.per_page.to_string()));
            params.push(("page", page.to_string()));

            let resp = self.get(token, path, &params).await?;
            if resp.status() == StatusCode::NO_CONTENT {
                debug!(path, page, "no content");
                break;
            }
            let items: Vec<T> = resp
                .json()
                .await
                .map_err(|e| AppError::UpstreamError(format!("Unexpected GitHub payload from {}: {}", path, e)))?;
            let count = items.len();
            all.extend(items);

            if count < self.per_page as usize {
                break;
            }
            if page == self.max_pages {
                debug!(path, max_pages = self.max_pages, "pagination bound reached");
            }
        }

        Ok(all)
    }
}

pub(crate) async fn check_status(resp: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    debug!(path, status = status.as_u16(), body = %body, "GitHub request failed");
    Err(AppError::from_upstream_status(status.as_u16(), format!("GitHub {}", path)))
}
