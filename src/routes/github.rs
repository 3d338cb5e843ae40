//! GitHub passthrough endpoints, called with the signed-in user's token.
//!
//! GET /api/github/repos
//! GET /api/github/repos/{owner}/{repo}/contributors
//! GET /api/github/repos/{owner}/{repo}/commits?path=&since=&until=&sha=
//! GET /api/github/repos/{owner}/{repo}/blame?path=&rev=
//! GET /api/github/parse-url?url=

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::github::location::parse_file_url;
use crate::github::CommitFilter;
use crate::models::{CommitSummary, Contributor, FileBlame, FileLocation, Repository};
use crate::state::SharedState;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/api/github/repos", get(list_repos))
        .route("/api/github/repos/{owner}/{repo}/contributors", get(list_contributors))
        .route("/api/github/repos/{owner}/{repo}/commits", get(list_commits))
        .route("/api/github/repos/{owner}/{repo}/blame", get(get_blame))
        .route("/api/github/parse-url", get(parse_url))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    path: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlameQuery {
    path: String,
    rev: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseUrlQuery {
    url: String,
}

async fn list_repos(State(state): State<SharedState>, AuthUser(user): AuthUser) -> Result<Json<Vec<Repository>>> {
    Ok(Json(state.github.list_repositories(&user.access_token).await?))
}

async fn list_contributors(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<Vec<Contributor>>> {
    let contributors = state
        .github
        .list_contributors(&user.access_token, &owner, &repo)
        .await?;
    Ok(Json(contributors))
}

async fn list_commits(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<Vec<CommitSummary>>> {
    let filter = CommitFilter {
        sha: query.sha,
        path: query.path,
        since: query.since,
        until: query.until,
    };
    let commits = state
        .github
        .list_commits(&user.access_token, &owner, &repo, &filter)
        .await?;
    Ok(Json(commits))
}

async fn get_blame(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<BlameQuery>,
) -> Result<Json<FileBlame>> {
    let blame = state
        .github
        .get_blame(&user.access_token, &owner, &repo, &query.path, query.rev.as_deref())
        .await?;
    Ok(Json(blame))
}

async fn parse_url(AuthUser(_): AuthUser, Query(query): Query<ParseUrlQuery>) -> Result<Json<FileLocation>> {
    Ok(Json(parse_file_url(&query.url)?))
}
