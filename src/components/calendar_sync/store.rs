use super::models::{CalendarEntry, EntryHandle, EntryPayload};
use crate::error::BotResult;
use async_trait::async_trait;

/// Target calendar the reconciler writes to
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Entry whose description contains `query`, if any
    async fn find(&self, query: &str) -> BotResult<Option<EntryHandle>>;

    async fn insert(&self, payload: &EntryPayload) -> BotResult<EntryHandle>;

    async fn update(&self, handle: &EntryHandle, payload: &EntryPayload) -> BotResult<()>;
}

/// First entry whose description contains the event URL
///
/// A full-text search may return entries that only mention parts of the URL,
/// so candidates are checked again here.
pub fn find_entry_by_url<'a>(entries: &'a [CalendarEntry], url: &str) -> Option<&'a CalendarEntry> {
    if url.is_empty() {
        return None;
    }
    entries.iter().find(|entry| entry.description.contains(url))
}
