//! Verdict artifacts: render a shareable card and publish it.

pub mod card;
pub mod storage;

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::CONTENT_TYPE;
use tracing::warn;

use crate::error::{AppError, Result};

pub use card::{CardTemplate, VerdictCard};
pub use storage::ObjectStorage;

/// Produces a publicly reachable artifact for a verdict.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    /// Returns the public URL. Rendering the same judgment again replaces
    /// the previous artifact.
    async fn render(&self, card: &VerdictCard) -> Result<String>;
}

/// SVG card uploaded to object storage as `{judgment_id}.svg`.
///
/// The avatar is embedded as a data URI so the card renders without
/// further requests; an avatar that cannot be fetched is left out.
pub struct SvgCardRenderer {
    template: CardTemplate,
    storage: ObjectStorage,
    http: reqwest::Client,
}

impl SvgCardRenderer {
    pub fn new(storage: ObjectStorage, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            template: CardTemplate::load()?,
            storage,
            http,
        })
    }

    async fn inline_avatar(&self, url: &str) -> Option<String> {
        let fetched = async {
            let resp = self.http.get(url).send().await?.error_for_status()?;
            let mime = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .filter(|m| m.starts_with("image/"))
                .map(str::to_string);
            let bytes = resp.bytes().await?;
            Ok::<_, reqwest::Error>((mime, bytes))
        }
        .await;

        match fetched {
            Ok((mime, bytes)) => {
                let mime = mime.unwrap_or_else(|| {
                    mime_guess::from_path(url).first_raw().unwrap_or("image/png").to_string()
                });
                Some(format!("data:{};base64,{}", mime, BASE64.encode(&bytes)))
            }
            Err(e) => {
                warn!(url, error = %e, "avatar unavailable, rendering card without it");
                None
            }
        }
    }
}

#[async_trait]
impl ArtifactRenderer for SvgCardRenderer {
    async fn render(&self, card: &VerdictCard) -> Result<String> {
        let mut card = card.clone();
        if let Some(url) = card.target_avatar.take() {
            card.target_avatar = self.inline_avatar(&url).await;
        }

        let svg = self.template.render(&card)?;
        let file_name = format!("{}.svg", card.judgment_id);
        self.storage.upload(&file_name, svg.into_bytes()).await
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    use super::*;

    #[tokio::test]
    async fn renders_and_uploads_under_judgment_id() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/storage/v1/object/blame-images/j-9.svg"),
                request::body(matches("@bob")),
            ])
            .times(2)
            .respond_with(status_code(200)),
        );
        let storage =
            ObjectStorage::new(server.url_str(""), "k", "blame-images", Duration::from_secs(5)).unwrap();
        let renderer = SvgCardRenderer::new(storage, Duration::from_secs(5)).unwrap();

        let card = VerdictCard {
            judgment_id: "j-9".to_string(),
            repo_name: "acme/shop".to_string(),
            title: "bug".to_string(),
            incident_at: Utc::now(),
            target_username: "bob".to_string(),
            target_avatar: None,
            responsibility: 55,
            message: "bob!".to_string(),
            last_commit_msg: "Unknown commit".to_string(),
        };
        let first = renderer.render(&card).await.unwrap();
        let second = renderer.render(&card).await.unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with("/blame-images/j-9.svg"));
    }

    fn card_with_avatar(avatar: String) -> VerdictCard {
        VerdictCard {
            judgment_id: "j-1".to_string(),
            repo_name: "acme/shop".to_string(),
            title: "bug".to_string(),
            incident_at: Utc::now(),
            target_username: "alice".to_string(),
            target_avatar: Some(avatar),
            responsibility: 80,
            message: "alice!".to_string(),
            last_commit_msg: "refactor".to_string(),
        }
    }

    #[tokio::test]
    async fn avatar_is_embedded_as_data_uri() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/u/alice")).respond_with(
                status_code(200)
                    .insert_header("content-type", "image/png")
                    .body("PNG"),
            ),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/storage/v1/object/blame-images/j-1.svg"),
                request::body(matches(r"base64,UE5H")),
                request::body(not(matches(r#"href="http"#))),
            ])
            .respond_with(status_code(200)),
        );
        let storage =
            ObjectStorage::new(server.url_str(""), "k", "blame-images", Duration::from_secs(5)).unwrap();
        let renderer = SvgCardRenderer::new(storage, Duration::from_secs(5)).unwrap();

        renderer.render(&card_with_avatar(server.url_str("/u/alice"))).await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_avatar_is_left_out() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/u/alice")).respond_with(status_code(404)),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/storage/v1/object/blame-images/j-1.svg"),
                request::body(matches("@alice")),
                request::body(not(matches("<image"))),
            ])
            .respond_with(status_code(200)),
        );
        let storage =
            ObjectStorage::new(server.url_str(""), "k", "blame-images", Duration::from_secs(5)).unwrap();
        let renderer = SvgCardRenderer::new(storage, Duration::from_secs(5)).unwrap();

        renderer.render(&card_with_avatar(server.url_str("/u/alice"))).await.unwrap();
    }
}
