use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::analysis::analyzer::MAX_CONTEXT_COMMITS;
use crate::analysis::{blame_shares, BlameShare, Incident, SuspectVerdict};
use crate::error::{AppError, Result};
use crate::github::location::split_repo_name;
use crate::github::CommitFilter;
use crate::models::{CommitSummary, CreateJudgmentRequest, JudgmentResponse, JudgmentSummary, SuspectResponse};
use crate::orchestrator::JudgmentOrchestrator;
use crate::store::conversions::{judgment_response, judgment_summary};
use crate::store::entities::{judgment, user};
use crate::store::NewJudgment;

/// Commit window used when the request does not name one.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

impl JudgmentOrchestrator {
    /// Creates a judgment and runs analysis to completion. Analysis failures
    /// leave the judgment `failed` and are reported through it rather than
    /// as an error; gateway failures fail the judgment and propagate.
    pub async fn create_judgment(&self, user: &user::Model, req: CreateJudgmentRequest) -> Result<JudgmentResponse> {
        for (field, value) in [
            ("title", &req.title),
            ("description", &req.description),
            ("file_path", &req.file_path),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("{} must not be empty", field)));
            }
        }
        let (owner, repo) = split_repo_name(&req.repo_name)?;

        let created = self
            .store
            .create_judgment(NewJudgment {
                user_id: user.id.clone(),
                repo_name: req.repo_name.clone(),
                title: req.title.clone(),
                description: req.description.clone(),
                file_path: req.file_path.clone(),
            })
            .await?;

        let commits = match self
            .gather_commits(&user.access_token, owner, repo, &req.file_path, req.since_days)
            .await
        {
            Ok(commits) => commits,
            Err(e) => {
                self.store.fail_judgment(&created.id, &e.to_string()).await?;
                return Err(e);
            }
        };

        let blame = if commits.is_empty() {
            Vec::new()
        } else {
            self.file_blame(&user.access_token, owner, repo, &req.file_path).await
        };

        self.run_analysis(&created, &commits, &blame).await?;
        self.load_judgment(&created.id).await
    }

    /// Current line ownership of `path`. Best effort: a file with no blame
    /// on the default branch is still judged from its commits.
    async fn file_blame(&self, token: &str, owner: &str, repo: &str, path: &str) -> Vec<BlameShare> {
        match self.github.get_blame(token, owner, repo, path, None).await {
            Ok(blame) => blame_shares(&blame),
            Err(e) => {
                warn!(owner, repo, path, error = %e, "blame unavailable, analyzing commits only");
                Vec::new()
            }
        }
    }

    /// Commits touching `path`, newest first, capped at the analyzer's
    /// context size. An empty window widens to the full history once.
    async fn gather_commits(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
        since_days: Option<u32>,
    ) -> Result<Vec<CommitSummary>> {
        let days = since_days.unwrap_or(DEFAULT_WINDOW_DAYS);
        let mut filter = CommitFilter {
            path: Some(path.to_string()),
            since: Some(Utc::now() - Duration::days(i64::from(days))),
            ..CommitFilter::default()
        };

        let mut commits = self.github.list_commits(token, owner, repo, &filter).await?;
        if commits.is_empty() {
            debug!(owner, repo, path, days, "no commits in window, using full history");
            filter.since = None;
            commits = self.github.list_commits(token, owner, repo, &filter).await?;
        }

        commits.sort_by(|a, b| b.date.cmp(&a.date));
        commits.truncate(MAX_CONTEXT_COMMITS);
        Ok(commits)
    }

    /// Moves a pending judgment to `completed` or `failed`.
    pub async fn run_analysis(
        &self,
        judgment: &judgment::Model,
        commits: &[CommitSummary],
        blame: &[BlameShare],
    ) -> Result<()> {
        if commits.is_empty() {
            let reason = format!("No commits found for {}", judgment.file_path);
            warn!(judgment_id = %judgment.id, "{}", reason);
            return self.store.fail_judgment(&judgment.id, &reason).await;
        }

        let incident = Incident {
            title: &judgment.title,
            description: &judgment.description,
            file_path: &judgment.file_path,
            blame,
        };

        match self.analyzer.analyze(&incident, commits).await {
            Ok(verdicts) => {
                let suspects = enrich(verdicts, commits);
                self.store.complete_judgment(&judgment.id, &suspects).await?;
                info!(judgment_id = %judgment.id, suspects = suspects.len(), "analysis finished");
                Ok(())
            }
            Err(e) => {
                warn!(judgment_id = %judgment.id, error = %e, "analysis failed");
                self.store.fail_judgment(&judgment.id, &e.to_string()).await
            }
        }
    }

    pub async fn get_judgment(&self, user_id: &str, judgment_id: &str) -> Result<JudgmentResponse> {
        self.owned_judgment(user_id, judgment_id).await?;
        self.load_judgment(judgment_id).await
    }

    pub async fn list_judgments(&self, user_id: &str) -> Result<Vec<JudgmentSummary>> {
        self.store
            .list_judgments(user_id)
            .await?
            .into_iter()
            .map(judgment_summary)
            .collect()
    }

    pub async fn delete_judgment(&self, user_id: &str, judgment_id: &str) -> Result<()> {
        self.owned_judgment(user_id, judgment_id).await?;
        self.store.delete_judgment(judgment_id).await?;
        info!(judgment_id, "judgment deleted");
        Ok(())
    }

    async fn load_judgment(&self, judgment_id: &str) -> Result<JudgmentResponse> {
        let judgment = self
            .store
            .find_judgment(judgment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Judgment {}", judgment_id)))?;
        let suspects = self.store.suspects_for(judgment_id).await?;
        judgment_response(judgment, suspects)
    }
}

/// Attaches each suspect's avatar and latest commit subject from the
/// analysis context. `commits` is newest first.
fn enrich(verdicts: Vec<SuspectVerdict>, commits: &[CommitSummary]) -> Vec<SuspectResponse> {
    verdicts
        .into_iter()
        .map(|v| {
            let latest = commits.iter().find(|c| c.author == v.username);
            SuspectResponse {
                avatar_url: latest.and_then(|c| c.author_avatar.clone()),
                last_commit_msg: latest.and_then(|c| c.message.lines().next()).map(str::to_string),
                username: v.username,
                responsibility: v.responsibility,
                reason: v.reason,
            }
        })
        .collect()
}
