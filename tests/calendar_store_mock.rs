use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use pyconjp_cron::components::calendar_sync::models::{CalendarEntry, EventLocation};
use pyconjp_cron::components::calendar_sync::store::find_entry_by_url;
use pyconjp_cron::components::calendar_sync::{
    run_sync_pass, CalendarStore, EntryHandle, EntryPayload, EventReconciler, EventSource,
    ReconcilerConfig, SkipReason, SourceEvent, SyncAction, SyncSummary,
};
use pyconjp_cron::error::{google_calendar_error, BotResult};
use std::sync::Mutex;

/// In-memory calendar that searches descriptions like the real one
#[derive(Default)]
struct MockCalendar {
    entries: Mutex<Vec<CalendarEntry>>,
    /// Fail inserts whose summary contains this
    fail_on: Option<String>,
}

impl MockCalendar {
    fn entries(&self) -> Vec<CalendarEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarStore for MockCalendar {
    async fn find(&self, query: &str) -> BotResult<Option<EntryHandle>> {
        let entries = self.entries.lock().unwrap();
        Ok(find_entry_by_url(&entries, query).map(|entry| entry.external_id.clone()))
    }

    async fn insert(&self, payload: &EntryPayload) -> BotResult<EntryHandle> {
        if let Some(word) = &self.fail_on {
            if payload.summary.contains(word.as_str()) {
                return Err(google_calendar_error("insert rejected"));
            }
        }

        let mut entries = self.entries.lock().unwrap();
        let handle = EntryHandle(format!("entry-{}", entries.len() + 1));
        entries.push(CalendarEntry::from_payload(handle.clone(), payload));
        Ok(handle)
    }

    async fn update(&self, handle: &EntryHandle, payload: &EntryPayload) -> BotResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .iter_mut()
            .find(|entry| &entry.external_id == handle)
            .ok_or_else(|| google_calendar_error("no such entry"))?;
        *entry = CalendarEntry::from_payload(handle.clone(), payload);
        Ok(())
    }
}

/// Event source returning a fixed list
struct MockSource(Vec<SourceEvent>);

#[async_trait]
impl EventSource for MockSource {
    async fn fetch_events(&self) -> BotResult<Vec<SourceEvent>> {
        Ok(self.0.clone())
    }
}

fn jst(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn now() -> DateTime<Utc> {
    jst("2024-05-01T12:00:00+09:00").with_timezone(&Utc)
}

fn event(id: u64, title: &str) -> SourceEvent {
    SourceEvent {
        id,
        title: title.to_string(),
        description: String::new(),
        url: format!("https://pyconjp-staff.connpass.com/event/{}/", id),
        start_time: Some(jst("2024-05-10T19:00:00+09:00")),
        end_time: Some(jst("2024-05-10T21:00:00+09:00")),
        location: Some(EventLocation {
            address: "東京都千代田区".to_string(),
            venue: "会議室A".to_string(),
        }),
        updated_at: jst("2024-05-01T10:00:00+09:00"),
    }
}

fn reconciler() -> EventReconciler {
    EventReconciler::new(ReconcilerConfig::new(
        vec!["懇親会".to_string(), "Meat".to_string()],
        "Asia/Tokyo",
    ))
}

#[tokio::test]
async fn test_sync_pass_is_idempotent() {
    let calendar = MockCalendar::default();
    let source = MockSource(vec![event(101, "スタッフ定例"), event(102, "スプリント")]);
    let reconciler = reconciler();

    let first = run_sync_pass(&source, &reconciler, &calendar, now()).await.unwrap();
    assert_eq!(
        first,
        SyncSummary {
            events: 2,
            inserted: 2,
            ..Default::default()
        }
    );

    // A second run over the same events only updates
    let second = run_sync_pass(&source, &reconciler, &calendar, now()).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 2);
    assert_eq!(calendar.entries().len(), 2);
}

#[tokio::test]
async fn test_update_keeps_existing_entry() {
    let calendar = MockCalendar::default();
    let reconciler = reconciler();

    let original = event(101, "スタッフ定例");
    let action = reconciler.sync_event(&original, now(), &calendar).await.unwrap();
    let SyncAction::Insert(handle) = action else {
        panic!("expected insert, got {:?}", action);
    };

    let mut renamed = original.clone();
    renamed.title = "スタッフ定例 (会場変更)".to_string();
    renamed.location = None;

    let action = reconciler.sync_event(&renamed, now(), &calendar).await.unwrap();
    assert_eq!(action, SyncAction::Update(handle.clone()));

    let entries = calendar.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].external_id, handle);
    assert_eq!(entries[0].summary, "スタッフ定例 (会場変更)");
    assert_eq!(entries[0].location, None);
}

#[tokio::test]
async fn test_stale_and_excluded_events_are_skipped() {
    let calendar = MockCalendar::default();
    let reconciler = reconciler();

    let mut stale = event(101, "スタッフ定例");
    stale.updated_at = jst("2024-04-29T12:00:00+09:00");
    let party = event(102, "PyCon JP 懇親会");
    let mut past = event(103, "先週の定例");
    past.start_time = Some(jst("2024-04-30T19:00:00+09:00"));
    let mut undecided = event(104, "日程調整中");
    undecided.start_time = None;

    assert_eq!(
        reconciler.sync_event(&stale, now(), &calendar).await.unwrap(),
        SyncAction::Skip(SkipReason::Stale)
    );
    assert_eq!(
        reconciler.sync_event(&party, now(), &calendar).await.unwrap(),
        SyncAction::Skip(SkipReason::ExcludedTitle("懇親会".to_string()))
    );
    assert_eq!(
        reconciler.sync_event(&past, now(), &calendar).await.unwrap(),
        SyncAction::Skip(SkipReason::NotUpcoming)
    );
    assert_eq!(
        reconciler.sync_event(&undecided, now(), &calendar).await.unwrap(),
        SyncAction::Skip(SkipReason::NoStartTime)
    );

    assert!(calendar.entries().is_empty());
}

#[tokio::test]
async fn test_failed_event_does_not_stop_the_pass() {
    let calendar = MockCalendar {
        fail_on: Some("壊れた".to_string()),
        ..Default::default()
    };
    let source = MockSource(vec![
        event(101, "壊れたイベント"),
        event(102, "スタッフ定例"),
        event(103, "Meat party"),
    ]);

    let summary = run_sync_pass(&source, &reconciler(), &calendar, now()).await.unwrap();
    assert_eq!(
        summary,
        SyncSummary {
            events: 3,
            skipped: 1,
            inserted: 1,
            updated: 0,
            failed: 1,
        }
    );

    let entries = calendar.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0]
        .description
        .contains("https://pyconjp-staff.connpass.com/event/102/"));
}

#[tokio::test]
async fn test_payload_renders_location_and_missing_end() {
    let mut open_ended = event(101, "スタッフ定例");
    open_ended.end_time = None;

    let payload = reconciler().build_payload(&open_ended).unwrap();
    assert_eq!(payload.start, payload.end);
    assert_eq!(payload.start.time_zone.as_deref(), Some("Asia/Tokyo"));
    assert_eq!(payload.location.as_deref(), Some("東京都千代田区(会議室A)"));
    assert_eq!(
        payload.description,
        r#"<a href="https://pyconjp-staff.connpass.com/event/101/">https://pyconjp-staff.connpass.com/event/101/</a>"#
    );

    // Updated 23 hours ago is still fresh
    let mut almost_stale = event(102, "スタッフ定例");
    almost_stale.updated_at = (now() - Duration::hours(23)).fixed_offset();
    assert_eq!(reconciler().skip_reason(&almost_stale, now()), None);
}
