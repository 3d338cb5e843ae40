//! Sign-in endpoints.
//!
//! GET  /api/auth/github/login     -> redirect to GitHub's consent page
//! GET  /api/auth/github/callback  -> exchange code, upsert user, redirect with `?token=`
//! GET  /api/auth/me               -> current user
//! POST /api/auth/logout           -> stateless acknowledgement

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{LogoutResponse, UserResponse};
use crate::state::SharedState;
use crate::store::NewUser;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/api/auth/github/login", get(login))
        .route("/api/auth/github/callback", get(callback))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn login(State(state): State<SharedState>) -> Result<Redirect> {
    Ok(Redirect::temporary(&state.oauth.authorize_url()?))
}

async fn callback(State(state): State<SharedState>, Query(query): Query<CallbackQuery>) -> Result<Redirect> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let access_token = state.oauth.exchange_code(&code).await?;
    let profile = state.github.current_user(&access_token).await?;
    let user = state
        .store
        .upsert_user(NewUser {
            github_id: profile.id.to_string(),
            username: profile.login,
            avatar_url: profile.avatar_url,
            access_token,
        })
        .await?;
    let token = state.sessions.issue(&user.id, &user.username)?;
    info!(user_id = %user.id, username = %user.username, "signed in");

    let mut target = url::Url::parse(&state.frontend_url)
        .map_err(|e| AppError::Internal(format!("Invalid frontend URL: {}", e)))?;
    target.query_pairs_mut().append_pair("token", &token);
    Ok(Redirect::temporary(target.as_str()))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logged out".to_string(),
    })
}
