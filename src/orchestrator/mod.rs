//! Judgment pipeline.
//!
//! `JudgmentOrchestrator` sequences gateway, analyzer, message generator,
//! renderer and store calls. Operations are split by stage:
//! - `judgments`: create (fetch commits, analyze, complete or fail), read, delete
//! - `verdicts`: blame message generation, lookup and image attachment
//!
//! A judgment is `pending` until analysis finishes, then `completed` or
//! `failed`. Blame generation requires `completed` with at least one suspect.

pub mod judgments;
pub mod verdicts;

use std::sync::Arc;

use crate::analysis::{BlameMessageGenerator, ResponsibilityAnalyzer};
use crate::error::{AppError, Result};
use crate::github::GitHubClient;
use crate::render::ArtifactRenderer;
use crate::store::entities::judgment;
use crate::store::Store;

pub struct JudgmentOrchestrator {
    store: Store,
    github: GitHubClient,
    analyzer: ResponsibilityAnalyzer,
    messages: BlameMessageGenerator,
    /// Absent when no object storage is configured
    renderer: Option<Arc<dyn ArtifactRenderer>>,
}

impl JudgmentOrchestrator {
    pub fn new(
        store: Store,
        github: GitHubClient,
        analyzer: ResponsibilityAnalyzer,
        messages: BlameMessageGenerator,
        renderer: Option<Arc<dyn ArtifactRenderer>>,
    ) -> Self {
        Self {
            store,
            github,
            analyzer,
            messages,
            renderer,
        }
    }

    /// Loads a judgment the user owns: 404 when absent, 403 when it belongs
    /// to someone else.
    async fn owned_judgment(&self, user_id: &str, judgment_id: &str) -> Result<judgment::Model> {
        let judgment = self
            .store
            .find_judgment(judgment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Judgment {}", judgment_id)))?;
        if judgment.user_id != user_id {
            return Err(AppError::Forbidden("Not your judgment".to_string()));
        }
        Ok(judgment)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::{LlmError, RetryPolicy};
    use crate::store::entities::user;
    use crate::store::NewUser;

    pub struct Harness {
        pub store: Store,
        pub orchestrator: JudgmentOrchestrator,
        pub analysis_llm: Arc<ScriptedProvider>,
        pub message_llm: Arc<ScriptedProvider>,
    }

    /// Orchestrator over an in-memory store, scripted models and a GitHub
    /// API rooted at `github_url`.
    pub async fn harness(
        github_url: &str,
        analysis: Vec<std::result::Result<String, LlmError>>,
        messages: Vec<std::result::Result<String, LlmError>>,
        renderer: Option<Arc<dyn ArtifactRenderer>>,
    ) -> Harness {
        let store = Store::in_memory().await;
        let github = GitHubClient::new(github_url, Duration::from_secs(5), 100, 2).unwrap();
        let analysis_llm = Arc::new(ScriptedProvider::new(analysis));
        let message_llm = Arc::new(ScriptedProvider::new(messages));
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::ZERO,
        };
        let orchestrator = JudgmentOrchestrator::new(
            store.clone(),
            github,
            ResponsibilityAnalyzer::new(analysis_llm.clone(), policy),
            BlameMessageGenerator::new(message_llm.clone(), "English"),
            renderer,
        );
        Harness {
            store,
            orchestrator,
            analysis_llm,
            message_llm,
        }
    }

    /// Answers the file blame lookup with alice owning 12 of 15 lines.
    pub fn expect_file_blame(server: &httptest::Server) {
        use httptest::{matchers::*, responders::*, Expectation};

        let range = |start: u32, end: u32, oid: &str, login: &str| {
            serde_json::json!({
                "startingLine": start,
                "endingLine": end,
                "age": 1,
                "commit": {
                    "oid": oid,
                    "message": "change",
                    "committedDate": "2024-01-14T09:00:00Z",
                    "author": { "name": login, "email": null, "date": "2024-01-14T09:00:00Z", "user": { "login": login } }
                }
            })
        };
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(matches(r"blame\(path: \$path\)")),
            ])
            .respond_with(json_encoded(serde_json::json!({
                "data": { "repository": { "object": { "blame": { "ranges": [
                    range(1, 12, "aaa1111111", "alice"),
                    range(13, 15, "bbb2222222", "bob")
                ]}}}}
            }))),
        );
    }

    pub async fn user(store: &Store, github_id: &str, username: &str) -> user::Model {
        store
            .upsert_user(NewUser {
                github_id: github_id.to_string(),
                username: username.to_string(),
                avatar_url: None,
                access_token: format!("token-{}", username),
            })
            .await
            .unwrap()
    }
}
