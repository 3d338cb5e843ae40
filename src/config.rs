//! Process configuration.
//!
//! Every setting is a CLI flag with an environment fallback; `.env` is loaded
//! before parsing so local development needs no exported variables.

use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

use crate::llm::RetryPolicy;

/// GitBlame - ask a model who broke the build
#[derive(Parser, Debug, Clone)]
#[command(name = "gitblame")]
#[command(about = "Apportions blame for a bug across commit authors", long_about = None)]
pub struct Settings {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub github: GitHubArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub storage: StorageArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to run the server on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Relational store connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://gitblame.db?mode=rwc")]
    pub database_url: String,

    /// HMAC key for session tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    /// Session token lifetime
    #[arg(long, env = "SESSION_TTL_DAYS", default_value = "7")]
    pub session_ttl_days: i64,

    /// Where the OAuth callback sends the browser with `?token=`
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct GitHubArgs {
    #[arg(long, env = "GITHUB_CLIENT_ID")]
    pub github_client_id: String,

    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    pub github_client_secret: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,

    #[arg(long, env = "GITHUB_OAUTH_URL", default_value = "https://github.com")]
    pub github_oauth_url: String,

    #[arg(long, default_value = "30")]
    pub github_timeout_secs: u64,

    #[arg(long, default_value = "100")]
    pub github_per_page: u32,

    /// Upper bound on pages fetched by any list operation
    #[arg(long, default_value = "10")]
    pub github_max_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmProviderKind {
    Gemini,
    Anthropic,
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value = "gemini")]
    pub llm_provider: LlmProviderKind,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_API_URL", default_value = "https://generativelanguage.googleapis.com")]
    pub gemini_api_url: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-sonnet-4-20250514")]
    pub anthropic_model: String,

    #[arg(long, env = "ANTHROPIC_API_URL", default_value = "https://api.anthropic.com")]
    pub anthropic_api_url: String,

    #[arg(long, default_value = "60")]
    pub llm_timeout_secs: u64,

    /// Retries after the first analysis attempt on transient failures
    #[arg(long, default_value = "2")]
    pub analysis_max_retries: u32,

    #[arg(long, default_value = "1000")]
    pub analysis_backoff_ms: u64,

    /// Language of generated blame messages
    #[arg(long, env = "MESSAGE_LOCALE", default_value = "Korean")]
    pub message_locale: String,
}

impl LlmArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.analysis_max_retries,
            backoff: Duration::from_millis(self.analysis_backoff_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Supabase-compatible storage endpoint; image rendering is disabled when unset
    #[arg(long, env = "SUPABASE_URL")]
    pub storage_url: Option<String>,

    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub storage_key: Option<String>,

    #[arg(long, env = "STORAGE_BUCKET", default_value = "blame-images")]
    pub storage_bucket: String,
}
