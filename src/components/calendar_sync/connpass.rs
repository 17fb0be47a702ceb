use super::models::{EventLocation, SourceEvent};
use crate::config::Config;
use crate::error::{connpass_error, BotResult};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

const CONNPASS_EVENT_API: &str = "https://connpass.com/api/v1/event/";

/// Most events the API returns per request
const PAGE_SIZE: u32 = 100;

/// Supplies the events to mirror for one sync pass
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self) -> BotResult<Vec<SourceEvent>>;
}

/// `/api/v1/event/` response
#[derive(Debug, Deserialize)]
pub struct ConnpassResponse {
    #[serde(default)]
    pub events: Vec<ConnpassEvent>,
}

/// One event as connpass serializes it
#[derive(Debug, Clone, Deserialize)]
pub struct ConnpassEvent {
    pub event_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_url: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    pub updated_at: String,
}

fn parse_timestamp(field: &str, value: Option<&str>) -> BotResult<Option<DateTime<FixedOffset>>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(Some)
            .map_err(|e| connpass_error(&format!("Invalid {} '{}': {}", field, value, e))),
    }
}

impl TryFrom<ConnpassEvent> for SourceEvent {
    type Error = crate::error::Error;

    fn try_from(event: ConnpassEvent) -> BotResult<Self> {
        let updated_at = parse_timestamp("updated_at", Some(&event.updated_at))?
            .ok_or_else(|| connpass_error("Event has no updated_at"))?;
        let start_time = parse_timestamp("started_at", event.started_at.as_deref())?;
        let end_time = parse_timestamp("ended_at", event.ended_at.as_deref())?;

        let location = match (event.address, event.place) {
            (None, None) => None,
            (address, place) => Some(EventLocation {
                address: address.unwrap_or_default(),
                venue: place.unwrap_or_default(),
            }),
        };

        Ok(SourceEvent {
            id: event.event_id,
            title: event.title,
            description: event.description.unwrap_or_default(),
            url: event.event_url,
            start_time,
            end_time,
            location,
            updated_at,
        })
    }
}

/// Convert a response, dropping events whose timestamps do not parse
pub fn parse_events(response: ConnpassResponse) -> Vec<SourceEvent> {
    response
        .events
        .into_iter()
        .filter_map(|event| {
            let id = event.event_id;
            match SourceEvent::try_from(event) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Ignoring connpass event {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Reads events of the configured connpass series
#[derive(Clone)]
pub struct ConnpassClient {
    series_ids: Vec<u64>,
    client: Client,
}

impl ConnpassClient {
    pub fn new(config: &Config) -> Self {
        Self {
            series_ids: config.connpass_series_ids.clone(),
            client: Client::new(),
        }
    }

    async fn fetch_series(&self, series_id: u64) -> BotResult<Vec<SourceEvent>> {
        debug!("Get event info from connpass: {}", series_id);

        // order=1 sorts by update time, so the recent changes fit in one page
        let response = self
            .client
            .get(CONNPASS_EVENT_API)
            .query(&[
                ("series_id", series_id.to_string()),
                ("order", "1".to_string()),
                ("count", PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .map_err(|e| connpass_error(&format!("Failed to fetch series {}: {}", series_id, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(connpass_error(&format!(
                "Failed to fetch series {}: HTTP {}",
                series_id, status
            )));
        }

        let body: ConnpassResponse = response
            .json()
            .await
            .map_err(|e| connpass_error(&format!("Failed to parse series {}: {}", series_id, e)))?;

        Ok(parse_events(body))
    }
}

/// Merge per-series results, skipping failed series
///
/// Fails only when every series failed.
pub fn merge_series(results: Vec<(u64, BotResult<Vec<SourceEvent>>)>) -> BotResult<Vec<SourceEvent>> {
    let mut events = Vec::new();
    let mut last_error = None;
    let mut fetched = 0;

    for (series_id, result) in results {
        match result {
            Ok(series_events) => {
                fetched += 1;
                events.extend(series_events);
            }
            Err(e) => {
                error!("Failed to fetch connpass series {}: {}", series_id, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if fetched == 0 => Err(e),
        _ => Ok(events),
    }
}

#[async_trait]
impl EventSource for ConnpassClient {
    async fn fetch_events(&self) -> BotResult<Vec<SourceEvent>> {
        let mut results = Vec::with_capacity(self.series_ids.len());
        for series_id in &self.series_ids {
            results.push((*series_id, self.fetch_series(*series_id).await));
        }
        merge_series(results)
    }
}
