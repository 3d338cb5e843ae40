//! Blame verdict endpoints.
//!
//! POST /api/judgments/{id}/blame        {intensity} -> generate message, upsert
//! GET  /api/judgments/{id}/blame                    -> stored verdict
//! POST /api/judgments/{id}/blame/image              -> render card, attach URL
//!
//! Only a completed judgment with suspects can be blamed.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::{BlameCreate, BlameVerdict, ImageResponse};
use crate::state::SharedState;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/api/judgments/{id}/blame", get(get_blame).post(create_blame))
        .route("/api/judgments/{id}/blame/image", post(create_image))
        .with_state(state)
}

async fn create_blame(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<BlameCreate>,
) -> Result<Json<BlameVerdict>> {
    let verdict = state
        .judgments
        .generate_blame(&user.id, &id, body.intensity)
        .await?;
    Ok(Json(verdict))
}

async fn get_blame(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BlameVerdict>> {
    Ok(Json(state.judgments.get_blame(&user.id, &id).await?))
}

async fn create_image(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ImageResponse>> {
    Ok(Json(state.judgments.generate_image(&user.id, &id).await?))
}
