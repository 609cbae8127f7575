use crate::telegram::Update;
use crate::types::{AppError, Result};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

/// Header Telegram uses to echo the secret given to `setWebhook`
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Receive one Telegram update.
///
/// Always answers 200 once the secret check passes, so Telegram never
/// redelivers: malformed bodies and handler failures are only logged.
pub async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!("Rejected webhook call with missing or wrong secret token");
            return Err(AppError::Auth("Invalid webhook secret token".to_string()));
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed update payload");
            return Ok(StatusCode::OK);
        }
    };

    if let Err(e) = state.dispatcher.handle_update(&update).await {
        tracing::error!(update_id = update.update_id, error = %e, "Failed to handle update");
    }

    Ok(StatusCode::OK)
}
