use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    state.sessions.cleanup_expired();
    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: state.sessions.len(),
    })
}
