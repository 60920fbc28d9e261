//! HTTP trigger wrapper for scheduler-driven deployments.
//!
//! `POST /run` kicks off a sync in the background and answers immediately so
//! the external scheduler's request never times out on a long run. One run at
//! a time per process; overlapping triggers get `409` instead of racing the
//! store.

use crate::engine::SyncEngine;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub running: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            running: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/run", post(trigger_run))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn trigger_run(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let Ok(guard) = state.running.clone().try_lock_owned() else {
        return (StatusCode::CONFLICT, "a sync run is already in progress\n");
    };

    let engine = state.engine.clone();
    tokio::spawn(async move {
        let _guard = guard;
        match engine.run().await {
            Ok(outcome) => info!(
                "triggered sync finished: {} candidates, {} images, {} posts",
                outcome.candidates, outcome.images_resolved, outcome.total_posts
            ),
            Err(e) => error!("triggered sync failed: {e}"),
        }
    });

    (StatusCode::ACCEPTED, "accepted: sync running in background\n")
}

/// Serve the trigger endpoint until the process is stopped.
pub async fn serve(engine: Arc<SyncEngine>, bind: &str) -> anyhow::Result<()> {
    let state = AppState::new(engine);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("trigger server listening on {bind}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
