//! Entity → DTO conversions.

use crate::error::{AppError, Result};
use crate::models::{
    BlameVerdict, Intensity, JudgmentResponse, JudgmentStatus, JudgmentSummary, SuspectResponse,
    UserResponse,
};
use crate::store::entities::{blame, judgment, suspect, user};

fn percent(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

fn status(model: &judgment::Model) -> Result<JudgmentStatus> {
    model
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(format!("judgment {}: {}", model.id, e)))
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        UserResponse {
            id: m.id,
            github_id: m.github_id,
            username: m.username,
            avatar_url: m.avatar_url,
            created_at: m.created_at,
        }
    }
}

impl From<suspect::Model> for SuspectResponse {
    fn from(m: suspect::Model) -> Self {
        SuspectResponse {
            username: m.username,
            avatar_url: m.avatar_url,
            responsibility: percent(m.responsibility),
            reason: m.reason,
            last_commit_msg: m.last_commit_msg,
        }
    }
}

pub fn judgment_response(model: judgment::Model, suspects: Vec<suspect::Model>) -> Result<JudgmentResponse> {
    let status = status(&model)?;
    Ok(JudgmentResponse {
        id: model.id,
        repo_name: model.repo_name,
        title: model.title,
        description: model.description,
        file_path: model.file_path,
        status,
        error_message: model.error_message,
        created_at: model.created_at,
        suspects: suspects.into_iter().map(SuspectResponse::from).collect(),
    })
}

pub fn judgment_summary(model: judgment::Model) -> Result<JudgmentSummary> {
    let status = status(&model)?;
    Ok(JudgmentSummary {
        id: model.id,
        repo_name: model.repo_name,
        title: model.title,
        status,
        created_at: model.created_at,
    })
}

pub fn blame_verdict(model: blame::Model) -> Result<BlameVerdict> {
    let intensity = Intensity::parse(&model.intensity).ok_or_else(|| {
        AppError::Internal(format!("blame {}: unknown intensity {}", model.id, model.intensity))
    })?;
    Ok(BlameVerdict {
        judgment_id: model.judgment_id,
        target_username: model.target_username,
        target_avatar: model.target_avatar,
        responsibility: percent(model.responsibility),
        reason: model.reason,
        message: model.message,
        intensity,
        image_url: model.image_url,
        updated_at: model.updated_at,
    })
}
