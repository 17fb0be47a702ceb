use super::models::{EntryPayload, EventTime, SkipReason, SourceEvent, SyncAction};
use super::store::CalendarStore;
use crate::error::BotResult;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Immutable settings for the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Title substrings that keep an event out of the calendar
    pub excluded_titles: Vec<String>,
    /// Events last updated longer ago than this are not looked at
    pub freshness: Duration,
    /// IANA zone written next to every start and end time
    pub time_zone: String,
}

impl ReconcilerConfig {
    pub fn new(excluded_titles: Vec<String>, time_zone: impl Into<String>) -> Self {
        Self {
            excluded_titles,
            freshness: Duration::days(1),
            time_zone: time_zone.into(),
        }
    }
}

/// Maps source events onto insert or update calls against a calendar store
#[derive(Debug, Clone)]
pub struct EventReconciler {
    config: ReconcilerConfig,
}

impl EventReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    /// Reason to leave the event alone, checked before touching the store
    pub fn skip_reason(&self, event: &SourceEvent, now: DateTime<Utc>) -> Option<SkipReason> {
        let age = now.signed_duration_since(event.updated_at.with_timezone(&Utc));
        if age >= self.config.freshness {
            return Some(SkipReason::Stale);
        }

        let Some(start) = event.start_time else {
            return Some(SkipReason::NoStartTime);
        };
        if start.with_timezone(&Utc) <= now {
            return Some(SkipReason::NotUpcoming);
        }

        self.config
            .excluded_titles
            .iter()
            .find(|word| !word.is_empty() && event.title.contains(word.as_str()))
            .map(|word| SkipReason::ExcludedTitle(word.clone()))
    }

    /// Calendar body for an event; `None` without a start time
    pub fn build_payload(&self, event: &SourceEvent) -> Option<EntryPayload> {
        let start = event.start_time?;
        // An event without an end is entered as a point in time
        let end = event.end_time.unwrap_or(start);

        let zoned = |time: chrono::DateTime<chrono::FixedOffset>| EventTime {
            date_time: Some(time.to_rfc3339()),
            time_zone: Some(self.config.time_zone.clone()),
        };

        Some(EntryPayload {
            summary: event.title.clone(),
            description: format!(r#"<a href="{0}">{0}</a>"#, event.url),
            start: zoned(start),
            end: zoned(end),
            location: event.location.as_ref().and_then(|location| location.render()),
        })
    }

    /// Insert or update the calendar entry for one event
    ///
    /// Store errors are returned as-is; the caller decides whether the run goes on.
    pub async fn sync_event(
        &self,
        event: &SourceEvent,
        now: DateTime<Utc>,
        store: &dyn CalendarStore,
    ) -> BotResult<SyncAction> {
        if let Some(reason) = self.skip_reason(event, now) {
            debug!("Skipping event {} ({}): {}", event.id, event.title, reason);
            return Ok(SyncAction::Skip(reason));
        }

        let Some(payload) = self.build_payload(event) else {
            return Ok(SyncAction::Skip(SkipReason::NoStartTime));
        };

        match store.find(&event.url).await? {
            Some(handle) => {
                store.update(&handle, &payload).await?;
                info!("Update calendar event: {}", event.title);
                Ok(SyncAction::Update(handle))
            }
            None => {
                let handle = store.insert(&payload).await?;
                info!("Insert calendar event: {}", event.title);
                Ok(SyncAction::Insert(handle))
            }
        }
    }
}
