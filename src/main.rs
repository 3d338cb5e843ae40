//! GitBlame - apportion blame for a bug across the authors who touched it
//!
//! # Usage
//! ```bash
//! gitblame                              # Serve with settings from env / .env
//! gitblame --port 9000 --llm-provider anthropic
//! ```

mod analysis;
mod auth;
mod config;
mod error;
mod github;
mod llm;
mod models;
mod orchestrator;
mod render;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Settings;
use state::AppState;
use store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments export variables directly
    let dotenv = dotenvy::dotenv();
    let settings = Settings::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gitblame=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let store = Store::connect(&settings.server.database_url)
        .await
        .context("connecting to database")?;
    store.migrate().await.context("running migrations")?;

    let state = Arc::new(AppState::from_settings(&settings, store.clone())?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "GitBlame listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    store.close().await.context("closing database")?;
    Ok(())
}
