use tracing::{info, warn};

use crate::analysis::MessageContext;
use crate::error::{AppError, Result};
use crate::models::{BlameVerdict, ImageResponse, Intensity, JudgmentStatus};
use crate::orchestrator::JudgmentOrchestrator;
use crate::render::VerdictCard;
use crate::store::blames::BlameRecord;
use crate::store::conversions::blame_verdict;
use crate::store::entities::suspect;

/// Card caption when the blamed author has no stored suspect record.
pub const UNKNOWN_COMMIT: &str = "Unknown commit";

/// Highest responsibility wins; ties go to the earliest suspect.
pub fn select_target(suspects: &[suspect::Model]) -> Option<&suspect::Model> {
    suspects.iter().fold(None, |best: Option<&suspect::Model>, s| match best {
        Some(b) if b.responsibility >= s.responsibility => Some(b),
        _ => Some(s),
    })
}

impl JudgmentOrchestrator {
    /// Generates and stores the blame message for the top suspect, replacing
    /// any previous verdict. Nothing is written if generation fails.
    pub async fn generate_blame(&self, user_id: &str, judgment_id: &str, intensity: Intensity) -> Result<BlameVerdict> {
        let judgment = self.owned_judgment(user_id, judgment_id).await?;
        if judgment.status != JudgmentStatus::Completed.as_str() {
            return Err(AppError::InvalidState(format!(
                "Judgment is {}, not completed",
                judgment.status
            )));
        }

        let suspects = self.store.suspects_for(judgment_id).await?;
        let target = select_target(&suspects)
            .ok_or_else(|| AppError::InvalidState("No suspects found".to_string()))?;
        let responsibility = target.responsibility.clamp(0, 100) as u8;

        let ctx = MessageContext {
            repo_name: &judgment.repo_name,
            title: &judgment.title,
            target_username: &target.username,
            responsibility,
            last_commit_msg: target.last_commit_msg.as_deref(),
            reason: &target.reason,
        };
        let message = self.messages.generate(&ctx, intensity).await?;

        let stored = self
            .store
            .upsert_blame(BlameRecord {
                judgment_id: judgment.id.clone(),
                target_username: target.username.clone(),
                target_avatar: target.avatar_url.clone(),
                responsibility,
                reason: target.reason.clone(),
                message,
                intensity,
            })
            .await?;
        info!(judgment_id, target = %stored.target_username, %intensity, "blame verdict stored");
        blame_verdict(stored)
    }

    pub async fn get_blame(&self, user_id: &str, judgment_id: &str) -> Result<BlameVerdict> {
        self.owned_judgment(user_id, judgment_id).await?;
        let blame = self
            .store
            .find_blame(judgment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blame for judgment {}", judgment_id)))?;
        blame_verdict(blame)
    }

    /// Renders the verdict card and attaches its URL. Not retried; the URL
    /// is stored only when rendering succeeds.
    pub async fn generate_image(&self, user_id: &str, judgment_id: &str) -> Result<ImageResponse> {
        let judgment = self.owned_judgment(user_id, judgment_id).await?;
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| AppError::UpstreamUnavailable("Image storage is not configured".to_string()))?;
        let blame = self
            .store
            .find_blame(judgment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blame for judgment {}", judgment_id)))?;

        let suspects = self.store.suspects_for(judgment_id).await?;
        let last_commit_msg = suspects
            .iter()
            .find(|s| s.username == blame.target_username)
            .and_then(|s| s.last_commit_msg.clone())
            .unwrap_or_else(|| UNKNOWN_COMMIT.to_string());

        let card = VerdictCard {
            judgment_id: judgment.id.clone(),
            repo_name: judgment.repo_name,
            title: judgment.title,
            incident_at: judgment.created_at,
            target_username: blame.target_username,
            target_avatar: blame.target_avatar,
            responsibility: blame.responsibility.clamp(0, 100) as u8,
            message: blame.message,
            last_commit_msg,
        };

        let image_url = renderer.render(&card).await.map_err(|e| {
            warn!(judgment_id, error = %e, "verdict card rendering failed");
            e
        })?;
        self.store.attach_blame_image(judgment_id, &image_url).await?;
        info!(judgment_id, image_url = %image_url, "verdict card attached");
        Ok(ImageResponse { image_url })
    }
}
