use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{send, LlmError, LlmProvider, LlmRequest};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
///
/// The API has no JSON response mode, so `json_mode` appends an explicit
/// instruction to the prompt instead.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    model: String,
    inner: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl AnthropicClient {
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
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let prompt = if request.json_mode {
            format!("{}\n\nRespond with a single JSON object and nothing else.", request.prompt)
        } else {
            request.prompt.clone()
        };
        let body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model = %self.model, json_mode = request.json_mode, "sending messages request");
        let raw = send(
            self.inner
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        )
        .await?;

        let parsed: MessagesResponse =
            serde_json::from_str(&raw).map_err(|e| LlmError::Decode(e.to_string()))?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}
