use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an event takes place
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventLocation {
    pub address: String,
    pub venue: String,
}

impl EventLocation {
    /// `address(venue)`, or nothing when there is no address
    pub fn render(&self) -> Option<String> {
        if self.address.trim().is_empty() {
            return None;
        }
        Some(format!("{}({})", self.address, self.venue))
    }
}

/// One event as published by the event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Natural key used to find the matching calendar entry
    pub url: String,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub location: Option<EventLocation>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Opaque id the calendar store assigns to an entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryHandle(pub String);

impl fmt::Display for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zoned timestamp in Google Calendar's `{dateTime, timeZone}` shape
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Body sent on insert and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPayload {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// An entry as stored in the target calendar
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarEntry {
    #[serde(rename = "id")]
    pub external_id: EntryHandle,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default)]
    pub location: Option<String>,
}

impl CalendarEntry {
    pub fn from_payload(external_id: EntryHandle, payload: &EntryPayload) -> Self {
        Self {
            external_id,
            summary: payload.summary.clone(),
            description: payload.description.clone(),
            start: payload.start.clone(),
            end: payload.end.clone(),
            location: payload.location.clone(),
        }
    }
}

/// Why an event was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not touched within the freshness window
    Stale,
    NoStartTime,
    /// Already started or starting right now
    NotUpcoming,
    /// Title holds this deny-listed word
    ExcludedTitle(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Stale => f.write_str("not updated recently"),
            SkipReason::NoStartTime => f.write_str("no start time"),
            SkipReason::NotUpcoming => f.write_str("not in the future"),
            SkipReason::ExcludedTitle(word) => write!(f, "title contains '{}'", word),
        }
    }
}

/// What the reconciler did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Skip(SkipReason),
    Insert(EntryHandle),
    Update(EntryHandle),
}
