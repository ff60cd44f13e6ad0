//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Command names the service accepts.
    pub commands: Vec<String>,
    pub stored_records: usize,
}

/// GET /health: Reports liveness and what the ledger can run.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let commands = state
        .commander
        .command_factory()
        .names()
        .into_iter()
        .map(String::from)
        .collect();
    Json(HealthResponse {
        status: "ok",
        commands,
        stored_records: state.store.record_count(),
    })
}
