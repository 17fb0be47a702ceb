use super::connpass::EventSource;
use super::models::SyncAction;
use super::reconciler::EventReconciler;
use super::store::CalendarStore;
use crate::error::BotResult;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Counters for one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub events: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

impl SyncSummary {
    pub fn record(&mut self, action: &SyncAction) {
        match action {
            SyncAction::Skip(_) => self.skipped += 1,
            SyncAction::Insert(_) => self.inserted += 1,
            SyncAction::Update(_) => self.updated += 1,
        }
    }
}

/// Fetch every source event once and reconcile each against the store
///
/// A failed event is logged and counted; the remaining events are still synced.
pub async fn run_sync_pass(
    source: &dyn EventSource,
    reconciler: &EventReconciler,
    store: &dyn CalendarStore,
    now: DateTime<Utc>,
) -> BotResult<SyncSummary> {
    let events = source.fetch_events().await?;
    let mut summary = SyncSummary {
        events: events.len(),
        ..Default::default()
    };

    for event in &events {
        match reconciler.sync_event(event, now, store).await {
            Ok(action) => summary.record(&action),
            Err(e) => {
                error!("Failed to sync event {} ({}): {}", event.id, event.url, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Sync pass done: {} events, {} inserted, {} updated, {} skipped, {} failed",
        summary.events, summary.inserted, summary.updated, summary.skipped, summary.failed
    );

    Ok(summary)
}
