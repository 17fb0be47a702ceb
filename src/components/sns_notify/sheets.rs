use crate::config::Config;
use crate::error::{google_sheets_error, BotResult};
use crate::utils::token::TokenManager;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Supplies the raw schedule rows for one notify pass
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_rows(&self) -> BotResult<Vec<Vec<String>>>;
}

/// `spreadsheets.values.get` response; `values` is absent for an empty range
#[derive(Debug, Deserialize, Default)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    /// Cells rendered as strings, the way the sheet shows them
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

/// Reads the notification schedule from Google Sheets
#[derive(Clone)]
pub struct SheetsClient {
    sheet_id: String,
    range: String,
    token_manager: TokenManager,
    client: Client,
}

impl SheetsClient {
    pub fn new(config: &Config, token_manager: TokenManager) -> Self {
        Self {
            sheet_id: config.schedule_sheet_id.clone(),
            range: config.schedule_sheet_range.clone(),
            token_manager,
            client: Client::new(),
        }
    }

    fn values_url(&self) -> BotResult<Url> {
        let mut url = Url::parse("https://sheets.googleapis.com/v4/spreadsheets/")
            .map_err(|e| google_sheets_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| google_sheets_error("Sheets URL cannot be a base"))?
            .pop_if_empty()
            .push(&self.sheet_id)
            .push("values")
            .push(&self.range);
        Ok(url)
    }
}

#[async_trait]
impl ScheduleSource for SheetsClient {
    async fn fetch_rows(&self) -> BotResult<Vec<Vec<String>>> {
        let access_token = self.token_manager.get_access_token().await?;
        let url = self.values_url()?;

        debug!("Fetching schedule rows from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_sheets_error(&format!("Failed to fetch rows: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_sheets_error(&format!(
                "Failed to fetch rows: HTTP {} - {}",
                status, error_body
            )));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| google_sheets_error(&format!("Failed to parse values response: {}", e)))?;

        Ok(range.into_rows())
    }
}
