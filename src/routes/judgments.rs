//! Judgment endpoints.
//!
//! POST   /api/judgments       -> create and analyze (201)
//! GET    /api/judgments       -> caller's judgments, newest first
//! GET    /api/judgments/{id}  -> judgment with suspects
//! DELETE /api/judgments/{id}  -> delete with suspects and verdict

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::{CreateJudgmentRequest, JudgmentResponse, JudgmentSummary};
use crate::state::SharedState;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/api/judgments", get(list_judgments).post(create_judgment))
        .route("/api/judgments/{id}", get(get_judgment).delete(delete_judgment))
        .with_state(state)
}

async fn create_judgment(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateJudgmentRequest>,
) -> Result<(StatusCode, Json<JudgmentResponse>)> {
    let judgment = state.judgments.create_judgment(&user, req).await?;
    Ok((StatusCode::CREATED, Json(judgment)))
}

async fn list_judgments(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<JudgmentSummary>>> {
    Ok(Json(state.judgments.list_judgments(&user.id).await?))
}

async fn get_judgment(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JudgmentResponse>> {
    Ok(Json(state.judgments.get_judgment(&user.id, &id).await?))
}

async fn delete_judgment(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.judgments.delete_judgment(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
