use super::matcher::ScheduleMatcher;
use super::models::{NotifyDecision, ScheduleRow};
use super::senders::ChannelSenders;
use super::sheets::ScheduleSource;
use crate::error::BotResult;
use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

/// Counters for one notify pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifySummary {
    pub rows: usize,
    /// Rows too short to be a rule
    pub inert: usize,
    /// Rows that fired on at least one channel
    pub fired: usize,
    pub sent: usize,
    pub failed: usize,
    /// Decisions for a channel that has no sender configured
    pub unconfigured: usize,
}

/// Send one fired row to every channel in the decision
pub async fn notify_row(
    row: &ScheduleRow,
    decision: NotifyDecision,
    senders: &ChannelSenders,
    summary: &mut NotifySummary,
) {
    for channel in decision.channels() {
        let Some(sender) = senders.get(channel) else {
            warn!("No {} sender configured, skipping: {}", channel, row.message);
            summary.unconfigured += 1;
            continue;
        };

        match sender.send(&row.message, row.link.as_deref()).await {
            Ok(()) => summary.sent += 1,
            Err(e) => {
                // One failed post must not stop the remaining channels and rows
                error!("Failed to send {} notification: {}", channel, e);
                summary.failed += 1;
            }
        }
    }
}

/// Read every schedule row once and post the ones due at `now`
pub async fn run_notify_pass(
    source: &dyn ScheduleSource,
    matcher: &ScheduleMatcher,
    senders: &ChannelSenders,
    now: NaiveDateTime,
) -> BotResult<NotifySummary> {
    let rows = source.fetch_rows().await?;
    let mut summary = NotifySummary {
        rows: rows.len(),
        ..Default::default()
    };

    for cells in &rows {
        let Some(row) = matcher.parse_row(cells) else {
            debug!("Ignoring short schedule row: {:?}", cells);
            summary.inert += 1;
            continue;
        };

        let decision = matcher.should_notify(&row, now);
        if decision.is_empty() {
            continue;
        }

        info!("Schedule row due at {}: {}", now, row.message);
        summary.fired += 1;
        notify_row(&row, decision, senders, &mut summary).await;
    }

    info!(
        "Notify pass done: {} rows, {} fired, {} sent, {} failed",
        summary.rows, summary.fired, summary.sent, summary.failed
    );

    Ok(summary)
}
