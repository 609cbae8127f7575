use serde::{Deserialize, Serialize};

// ============= Domain Types =============

/// A stored place or activity entry.
///
/// Column order in the spreadsheet is the field order here:
/// name, type, category, address, city, note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNote {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub address: String,
    pub city: String,
    pub note: String,
}

impl LocationNote {
    /// Number of spreadsheet columns a note occupies.
    pub const COLUMNS: usize = 6;

    /// Build a note from a spreadsheet row. Missing trailing cells become empty strings.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Self {
        let cell = |i: usize| row.get(i).map(|s| s.as_ref().to_string()).unwrap_or_default();

        Self {
            name: cell(0),
            kind: cell(1),
            category: cell(2),
            address: cell(3),
            city: cell(4),
            note: cell(5),
        }
    }

    /// The note as a spreadsheet row, in column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.kind.clone(),
            self.category.clone(),
            self.address.clone(),
            self.city.clone(),
            self.note.clone(),
        ]
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Storage(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::Telegram(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::Auth(msg) => (axum::http::StatusCode::UNAUTHORIZED, msg),
            AppError::Config(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
