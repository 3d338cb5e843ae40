use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::llm::{LlmProvider, LlmRequest};
use crate::models::Intensity;

const MAX_OUTPUT_TOKENS: u32 = 256;

/// Facts about the chosen suspect that go into the message prompt.
#[derive(Debug, Clone)]
pub struct MessageContext<'a> {
    pub repo_name: &'a str,
    pub title: &'a str,
    pub target_username: &'a str,
    pub responsibility: u8,
    pub last_commit_msg: Option<&'a str>,
    pub reason: &'a str,
}

/// Writes the short, shareable blame message for the top suspect.
///
/// No retry here: the caller may simply ask again.
pub struct BlameMessageGenerator {
    provider: Arc<dyn LlmProvider>,
    locale: String,
}

pub fn tone(intensity: Intensity) -> &'static str {
    match intensity {
        Intensity::Mild => {
            "polite and gentle, a soft request (\"could you take a look when you have time?\")"
        }
        Intensity::Medium => {
            "humorous (\"you owe the team a coffee\", \"maybe some tests next time...\")"
        }
        Intensity::Spicy => {
            "blunt and playful, teasing but never crossing the line (\"who wrote this?!\", \"own it, senpai\")"
        }
    }
}

impl BlameMessageGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, locale: impl Into<String>) -> Self {
        Self {
            provider,
            locale: locale.into(),
        }
    }

    pub fn build_prompt(&self, ctx: &MessageContext<'_>, intensity: Intensity) -> String {
        format!(
            r#"Write a blame message for the following incident.

Project: {repo}
Incident: {title}
Culprit: {user}
Responsibility: {resp}%
Related commit: {commit}
Reason: {reason}

Tone ({intensity}): {tone}

Write 2-3 sentences in {locale} and end with 1-2 fitting emoji.
Output only the message, no explanation."#,
            repo = ctx.repo_name,
            title = ctx.title,
            user = ctx.target_username,
            resp = ctx.responsibility,
            commit = ctx.last_commit_msg.unwrap_or("unknown"),
            reason = ctx.reason,
            intensity = intensity,
            tone = tone(intensity),
            locale = self.locale,
        )
    }

    pub async fn generate(&self, ctx: &MessageContext<'_>, intensity: Intensity) -> Result<String> {
        let request = LlmRequest::text(self.build_prompt(ctx, intensity), MAX_OUTPUT_TOKENS);
        debug!(target_user = ctx.target_username, %intensity, "generating blame message");

        let text = self.provider.complete(&request).await.map_err(|e| {
            warn!(error = %e, provider = self.provider.name(), "blame message generation failed");
            AppError::MessageGenerationFailed(e.to_string())
        })?;

        let message = text.trim();
        if message.is_empty() {
            return Err(AppError::MessageGenerationFailed("empty message".to_string()));
        }
        Ok(message.to_string())
    }
}
