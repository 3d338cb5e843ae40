//! Shared application state, built once at startup.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};

use crate::analysis::{BlameMessageGenerator, ResponsibilityAnalyzer};
use crate::auth::{GitHubOAuth, SessionKeys};
use crate::config::{LlmProviderKind, Settings};
use crate::github::GitHubClient;
use crate::llm::{AnthropicClient, GeminiClient, LlmProvider};
use crate::orchestrator::JudgmentOrchestrator;
use crate::render::{ArtifactRenderer, ObjectStorage, SvgCardRenderer};
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub github: GitHubClient,
    pub oauth: GitHubOAuth,
    pub sessions: SessionKeys,
    pub judgments: JudgmentOrchestrator,
    pub frontend_url: String,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn from_settings(settings: &Settings, store: Store) -> anyhow::Result<Self> {
        let gh = &settings.github;
        let github_timeout = std::time::Duration::from_secs(gh.github_timeout_secs);
        let github = GitHubClient::new(&gh.github_api_url, github_timeout, gh.github_per_page, gh.github_max_pages)
            .context("building GitHub client")?;
        let oauth = GitHubOAuth::new(
            &gh.github_oauth_url,
            &gh.github_client_id,
            &gh.github_client_secret,
            github_timeout,
        )
        .context("building OAuth client")?;

        let provider = build_provider(settings)?;
        let analyzer = ResponsibilityAnalyzer::new(provider.clone(), settings.llm.retry_policy());
        let messages = BlameMessageGenerator::new(provider, &settings.llm.message_locale);

        let renderer = build_renderer(settings)?;
        let judgments = JudgmentOrchestrator::new(store.clone(), github.clone(), analyzer, messages, renderer);

        Ok(Self {
            store,
            github,
            oauth,
            sessions: SessionKeys::new(
                &settings.server.jwt_secret,
                chrono::Duration::days(settings.server.session_ttl_days),
            ),
            judgments,
            frontend_url: settings.server.frontend_url.clone(),
        })
    }
}

fn build_provider(settings: &Settings) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let llm = &settings.llm;
    let provider: Arc<dyn LlmProvider> = match llm.llm_provider {
        LlmProviderKind::Gemini => {
            let Some(key) = llm.gemini_api_key.as_deref() else {
                bail!("GEMINI_API_KEY is required when LLM_PROVIDER=gemini");
            };
            Arc::new(
                GeminiClient::new(&llm.gemini_api_url, key, &llm.gemini_model, llm.timeout())
                    .context("building Gemini client")?,
            )
        }
        LlmProviderKind::Anthropic => {
            let Some(key) = llm.anthropic_api_key.as_deref() else {
                bail!("ANTHROPIC_API_KEY is required when LLM_PROVIDER=anthropic");
            };
            Arc::new(
                AnthropicClient::new(&llm.anthropic_api_url, key, &llm.anthropic_model, llm.timeout())
                    .context("building Anthropic client")?,
            )
        }
    };
    info!(provider = provider.name(), "LLM provider ready");
    Ok(provider)
}

fn build_renderer(settings: &Settings) -> anyhow::Result<Option<Arc<dyn ArtifactRenderer>>> {
    let storage = &settings.storage;
    let (Some(url), Some(key)) = (storage.storage_url.as_deref(), storage.storage_key.as_deref()) else {
        warn!("object storage not configured, verdict images are disabled");
        return Ok(None);
    };
    let timeout = std::time::Duration::from_secs(30);
    let objects =
        ObjectStorage::new(url, key, &storage.storage_bucket, timeout).context("building object storage client")?;
    let renderer = SvgCardRenderer::new(objects, timeout).context("loading verdict card template")?;
    Ok(Some(Arc::new(renderer)))
}
