use crate::config::Config;
use crate::error::{token_error, BotResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// OAuth token endpoint used for refresh grants
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds of validity a cached token must still have to be reused
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Authorized user token as kept in the token file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp after which the access token is stale
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl StoredToken {
    /// Whether the access token can still be used at `now`
    pub fn is_fresh(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expiry) => expiry > now + EXPIRY_MARGIN_SECS,
            // No expiry recorded, let the API reject it if it is stale
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Hands out Google access tokens shared by the Sheets and Calendar clients
#[derive(Clone)]
pub struct TokenManager {
    client_id: String,
    client_secret: String,
    token_file: PathBuf,
    client: Client,
    cached: Arc<Mutex<Option<StoredToken>>>,
}

impl TokenManager {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_file: PathBuf::from(&config.google_token_file),
            client: Client::new(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Get an access token, refreshing and saving it when expired
    pub async fn get_access_token(&self) -> BotResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let token = match cached.take() {
            Some(token) => token,
            None => self.read_token_file().await?,
        };

        let token = if token.is_fresh(now) {
            token
        } else {
            let refreshed = self.refresh_token(&token).await?;
            self.write_token_file(&refreshed).await?;
            refreshed
        };

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn read_token_file(&self) -> BotResult<StoredToken> {
        debug!("Reading Google token from {}", self.token_file.display());
        let content = tokio::fs::read_to_string(&self.token_file)
            .await
            .map_err(|e| {
                token_error(&format!(
                    "Failed to read {}: {}",
                    self.token_file.display(),
                    e
                ))
            })?;

        serde_json::from_str(&content)
            .map_err(|e| token_error(&format!("Failed to parse token JSON: {}", e)))
    }

    async fn write_token_file(&self, token: &StoredToken) -> BotResult<()> {
        let content = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.token_file, content).await?;
        Ok(())
    }

    /// Refresh an expired token
    async fn refresh_token(&self, token: &StoredToken) -> BotResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| token_error("Token expired and no refresh token available"))?;

        info!("Refreshing Google access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| token_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(token_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| token_error(&format!("Failed to parse token response: {}", e)))?;

        let expires_in = refreshed.expires_in.unwrap_or(3600);

        Ok(StoredToken {
            access_token: refreshed.access_token,
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Some(Utc::now().timestamp() + expires_in),
        })
    }
}
