//! API route handlers.
//!
//! Each submodule defines routes for a feature area:
//! - `auth`: GitHub OAuth sign-in and the current session
//! - `github`: repositories, contributors, commits, blame, URL parsing
//! - `judgments`: incident submission, analysis and history
//! - `blame`: verdict messages and shareable cards

pub mod auth;
pub mod blame;
pub mod github;
pub mod judgments;

use axum::{routing::get, Router};

use crate::state::SharedState;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes(state.clone()))
        .merge(github::routes(state.clone()))
        .merge(judgments::routes(state.clone()))
        .merge(blame::routes(state))
}

async fn health() -> &'static str {
    "OK"
}
