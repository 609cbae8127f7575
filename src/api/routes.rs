use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/webhook",
            post(crate::api::handlers::webhook::receive_update),
        )
        .route("/health", get(crate::api::handlers::health::health))
}
