use crate::sheets::auth::{
    AccessTokenSource, ServiceAccountKey, ServiceAccountTokenProvider, SPREADSHEETS_SCOPE,
};
use crate::store::RecordStore;
use crate::types::{AppError, LocationNote, Result};
use crate::utils::toml_config::SheetsConfig;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Notes stored in one tab of a Google spreadsheet, columns A..F
pub struct SheetsRecordStore {
    http: reqwest::Client,
    api_base: Url,
    spreadsheet_id: String,
    sheet_name: String,
    auth: Arc<dyn AccessTokenSource>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody {
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

impl SheetsRecordStore {
    pub fn new(
        api_base: &str,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        auth: Arc<dyn AccessTokenSource>,
    ) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| AppError::Config(format!("Invalid Sheets API base URL: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_base,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            auth,
        })
    }

    /// Build a store from config, loading the service account key from disk
    pub async fn from_config(config: &SheetsConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials_path).await?;
        let provider = ServiceAccountTokenProvider::new(key, SPREADSHEETS_SCOPE)?;

        tracing::info!(
            spreadsheet_id = %config.spreadsheet_id,
            sheet = %config.sheet_name,
            client_email = %provider.client_email(),
            "Using Google Sheets record store"
        );

        Self::new(
            &config.api_base,
            config.spreadsheet_id.clone(),
            config.sheet_name.clone(),
            Arc::new(provider),
        )
    }

    /// Data rows only; row 1 holds the column headers
    fn read_range(&self) -> String {
        format!("{}!A2:F", quote_sheet_name(&self.sheet_name))
    }

    fn append_range(&self) -> String {
        format!("{}!A:F", quote_sheet_name(&self.sheet_name))
    }

    fn values_url(&self, last_segment: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Sheets API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", last_segment]);
        Ok(url)
    }

    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        AppError::Storage(format!("Sheets API returned {}: {}", status, message))
    }
}

/// Render a cell as text. Sheets returns formatted strings, but numbers
/// and booleans can appear with other render options.
/// Sheet name as written in A1 notation: bare when it is a plain word,
/// otherwise single-quoted with embedded quotes doubled
fn quote_sheet_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RecordStore for SheetsRecordStore {
    async fn fetch_all(&self) -> Result<Vec<LocationNote>> {
        let url = self.values_url(&self.read_range())?;
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Sheets read failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Unreadable Sheets response: {}", e)))?;

        let notes: Vec<LocationNote> = range
            .values
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(cell_to_string).collect();
                LocationNote::from_row(&cells)
            })
            .collect();

        tracing::debug!(rows = notes.len(), "Fetched notes from spreadsheet");
        Ok(notes)
    }

    async fn append(&self, note: &LocationNote) -> Result<()> {
        let url = self.values_url(&format!("{}:append", self.append_range()))?;
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&AppendBody {
                values: vec![note.to_row()],
            })
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Sheets append failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        tracing::info!(name = %note.name, "Appended note to spreadsheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::auth::StaticToken;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> SheetsRecordStore {
        SheetsRecordStore::new(
            &server.uri(),
            "sheet-123",
            "Sheet1",
            Arc::new(StaticToken("test-token".to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&json!("Hanoi")), "Hanoi");
        assert_eq!(cell_to_string(&json!(42)), "42");
        assert_eq!(cell_to_string(&json!(true)), "true");
        assert_eq!(cell_to_string(&Value::Null), "");
    }

    #[tokio::test]
    async fn test_values_url_encoding() {
        let server = MockServer::start().await;
        let store = SheetsRecordStore::new(
            &format!("{}/", server.uri()),
            "sheet-123",
            "My Places",
            Arc::new(StaticToken("t".to_string())),
        )
        .unwrap();

        let url = store.values_url(&store.read_range()).unwrap();
        assert!(url
            .as_str()
            .ends_with("/v4/spreadsheets/sheet-123/values/'My%20Places'!A2:F"));
    }

    #[rstest]
    #[case("Sheet1", "Sheet1")]
    #[case("places_2024", "places_2024")]
    #[case("My Places", "'My Places'")]
    #[case("Bob's list", "'Bob''s list'")]
    #[case("Địa điểm", "'Địa điểm'")]
    fn test_quote_sheet_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(quote_sheet_name(name), expected);
    }

    #[tokio::test]
    async fn test_append_quotes_sheet_name_with_apostrophe() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/values/'Bob''s%20list'!A:F:append"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let store = SheetsRecordStore::new(
            &server.uri(),
            "sheet-123",
            "Bob's list",
            Arc::new(StaticToken("t".to_string())),
        )
        .unwrap();

        store
            .append(&LocationNote {
                name: "Pho24".to_string(),
                ..Default::default()
            })
            .await
            .expect("append should succeed");
    }

    #[tokio::test]
    async fn test_fetch_all_maps_rows() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A2:F"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Sheet1!A2:F3",
                "majorDimension": "ROWS",
                "values": [
                    ["Pho24", "Pho", "food", "", "Hanoi", ""],
                    ["Cong", "Cafe", "chill"]
                ]
            })))
            .mount(&server)
            .await;

        let notes = store_for(&server).fetch_all().await.unwrap();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].name, "Pho24");
        assert_eq!(notes[0].city, "Hanoi");
        assert_eq!(notes[1].category, "chill");
        assert_eq!(notes[1].city, "");
    }

    #[tokio::test]
    async fn test_fetch_all_empty_sheet() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A2:F"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Sheet1!A2:F1000",
                "majorDimension": "ROWS"
            })))
            .mount(&server)
            .await;

        let notes = store_for(&server).fetch_all().await.unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_append_posts_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A:F:append"))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "values": [["Pho24", "Pho", "food", "", "Hanoi", ""]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-123",
                "updates": {"updatedRows": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let note = LocationNote {
            name: "Pho24".to_string(),
            kind: "Pho".to_string(),
            category: "food".to_string(),
            address: String::new(),
            city: "Hanoi".to_string(),
            note: String::new(),
        };

        store_for(&server).append(&note).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_becomes_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {
                    "code": 403,
                    "message": "The caller does not have permission",
                    "status": "PERMISSION_DENIED"
                }
            })))
            .mount(&server)
            .await;

        match store_for(&server).fetch_all().await {
            Err(AppError::Storage(msg)) => {
                assert!(msg.contains("403"));
                assert!(msg.contains("does not have permission"));
            }
            other => panic!("expected storage error, got {:?}", other),
        }
    }
}
