use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{send, LlmError, LlmProvider, LlmRequest};

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    inner: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let inner = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            inner,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let mut generation_config = json!({ "maxOutputTokens": request.max_tokens });
        if request.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": generation_config,
        });

        debug!(model = %self.model, json_mode = request.json_mode, "sending generateContent");
        let raw = send(
            self.inner
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;

        let parsed: GenerateResponse =
            serde_json::from_str(&raw).map_err(|e| LlmError::Decode(e.to_string()))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn client(server: &Server) -> GeminiClient {
        GeminiClient::new(server.url_str(""), "k", "gemini-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn json_mode_sets_response_mime_type() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1beta/models/gemini-test:generateContent"),
                request::headers(contains(("x-goog-api-key", "k"))),
                request::body(json_decoded(eq(json!({
                    "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                    "generationConfig": { "maxOutputTokens": 64, "responseMimeType": "application/json" },
                })))),
            ])
            .respond_with(json_encoded(json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"ok\":true}" }] } }]
            }))),
        );

        let text = client(&server).complete(&LlmRequest::json("hi", 64)).await.unwrap();
        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn empty_candidates_are_transient() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/v1beta/models/gemini-test:generateContent",
            ))
            .respond_with(json_encoded(json!({ "candidates": [] }))),
        );

        let err = client(&server).complete(&LlmRequest::text("hi", 64)).await.unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn rate_limit_is_classified() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/v1beta/models/gemini-test:generateContent",
            ))
            .respond_with(status_code(429)),
        );

        let err = client(&server).complete(&LlmRequest::text("hi", 64)).await.unwrap_err();
        assert_eq!(err, LlmError::RateLimited);
    }
}
