//! LLM provider seam.
//!
//! The analyzer and message generator only see `LlmProvider`; concrete
//! clients (`GeminiClient`, `AnthropicClient`) are constructed once at
//! startup and injected. Transport failures are classified into `LlmError`
//! so `RetryPolicy` can decide what is worth another attempt.

mod anthropic;
mod gemini;
mod retry;

use reqwest::StatusCode;
use thiserror::Error;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRequest {
    pub prompt: String,
    /// Ask the provider for a JSON-only response when it supports that mode
    pub json_mode: bool,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn text(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            json_mode: false,
            max_tokens,
        }
    }

    pub fn json(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            json_mode: true,
            max_tokens,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("empty response from model")]
    EmptyResponse,

    #[error("unexpected provider payload: {0}")]
    Decode(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Timeout | LlmError::RateLimited | LlmError::Network(_) | LlmError::EmptyResponse => {
                true
            }
            LlmError::Status { status, .. } => *status >= 500,
            LlmError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::Decode(e.to_string())
        } else {
            LlmError::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Sends one prompt and returns the model's text, never empty.
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError>;
}

/// Sends a prepared request and returns the raw body of a 2xx response.
pub(crate) async fn send(builder: reqwest::RequestBuilder) -> Result<String, LlmError> {
    let resp = builder.send().await?;
    let status = resp.status();
    let body = resp.text().await?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited);
    }
    if status == StatusCode::REQUEST_TIMEOUT {
        return Err(LlmError::Timeout);
    }
    if !status.is_success() {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: truncate(&body, 512),
        });
    }
    Ok(body)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Provider that replays a fixed script of outcomes and records prompts.
    pub struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, LlmError>>>,
        pub prompts: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn last_prompt(&self) -> String {
            self.prompts
                .lock()
                .unwrap()
                .last()
                .map(|r| r.prompt.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::EmptyResponse.is_transient());
        assert!(LlmError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!LlmError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!LlmError::Decode("bad".into()).is_transient());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "가나다라";
        let t = truncate(s, 4);
        assert!(t.starts_with('가'));
        assert!(t.ends_with("..."));
    }
}
