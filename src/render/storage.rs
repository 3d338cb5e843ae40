use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Supabase-compatible object storage bucket.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    base_url: String,
    key: String,
    bucket: String,
    http: reqwest::Client,
}

impl ObjectStorage {
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            bucket: bucket.into(),
            http,
        })
    }

    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, file_name)
    }

    /// Uploads, overwriting any object with the same name, and returns the
    /// public URL. The content type is guessed from the file extension.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let content_type = mime_guess::from_path(file_name).first_or_octet_stream();
        let size = bytes.len();

        let resp = self
            .http
            .post(format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, file_name))
            .header(AUTHORIZATION, format!("Bearer {}", self.key))
            .header("apikey", &self.key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type.as_ref())
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "object upload failed");
            // Storage credentials are ours, not the caller's, so no 401/403 passthrough
            return Err(if status.is_server_error() {
                AppError::UpstreamUnavailable(format!("Object storage returned {}", status))
            } else {
                AppError::UpstreamError(format!("Object storage returned {}", status))
            });
        }

        info!(bucket = %self.bucket, file_name, size, "uploaded object");
        Ok(self.public_url(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn storage(server: &Server) -> ObjectStorage {
        ObjectStorage::new(server.url_str(""), "service-key", "blame-images", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn upserts_and_returns_public_url() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/storage/v1/object/blame-images/j-1.svg"),
                request::headers(contains(("x-upsert", "true"))),
                request::headers(contains(("content-type", "image/svg+xml"))),
                request::headers(contains(("authorization", "Bearer service-key"))),
                request::body(matches("^<svg/>$")),
            ])
            .respond_with(json_encoded(serde_json::json!({ "Key": "blame-images/j-1.svg" }))),
        );

        let s = storage(&server);
        let url = s.upload("j-1.svg", b"<svg/>".to_vec()).await.unwrap();
        assert_eq!(url, s.public_url("j-1.svg"));
        assert!(url.ends_with("/storage/v1/object/public/blame-images/j-1.svg"));
    }

    #[tokio::test]
    async fn rejected_upload_is_upstream_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/storage/v1/object/blame-images/x.svg"))
                .respond_with(status_code(403)),
        );
        let err = storage(&server).upload("x.svg", vec![1]).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamError(_)));
    }
}
