//! Google service account authentication
//!
//! Implements the OAuth 2.0 JWT-bearer flow used by service accounts:
//!
//! 1. Sign an RS256 JWT assertion with the account's private key
//!    (`iss` = client email, `aud` = token URI, one hour lifetime).
//! 2. Exchange it at the token URI for a short-lived bearer token.
//! 3. Reuse the bearer token until shortly before it expires.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

/// Read/write access to spreadsheets
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens for Google API calls
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed bearer token, for tests and pre-authorised environments
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// The fields of a service account JSON key that the flow needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Auth(format!("Invalid service account key: {}", e)))
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Auth(format!(
                "Failed to read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Exchanges signed assertions for bearer tokens and caches the result
pub struct ServiceAccountTokenProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::Auth(format!("Invalid service account private key: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            key,
            encoding_key,
            scope: scope.into(),
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("Failed to sign token assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Unreadable token response: {}", e)))?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Obtained service account access token"
        );

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String> {
        // Held across the refresh so concurrent callers share one request
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}
