use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use pyconjp_cron::components::sns_notify::notifications::{run_notify_pass, NotifySummary};
use pyconjp_cron::components::sns_notify::senders::{ChannelSender, ChannelSenders};
use pyconjp_cron::components::sns_notify::sheets::ScheduleSource;
use pyconjp_cron::components::sns_notify::{Channel, MatcherConfig, ScheduleMatcher};
use pyconjp_cron::error::{channel_error, BotResult};
use std::sync::{Arc, Mutex};

/// Sender that records every post, optionally failing all of them
struct RecordingSender {
    channel: Channel,
    fail: bool,
    posts: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingSender {
    fn new(channel: Channel, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail,
            posts: Mutex::new(Vec::new()),
        })
    }

    fn posts(&self) -> Vec<(String, Option<String>)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, message: &str, link: Option<&str>) -> BotResult<()> {
        if self.fail {
            return Err(channel_error(self.channel.name(), "rate limited"));
        }
        self.posts
            .lock()
            .unwrap()
            .push((message.to_string(), link.map(str::to_string)));
        Ok(())
    }
}

/// Sheet returning fixed rows
struct MockSheet(Vec<Vec<String>>);

#[async_trait]
impl ScheduleSource for MockSheet {
    async fn fetch_rows(&self) -> BotResult<Vec<Vec<String>>> {
        Ok(self.0.clone())
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn sheet() -> MockSheet {
    MockSheet(vec![
        row(&["2024/05/01", "10:00", "チケット販売開始", "https://pycon.jp/", "", "", "1", "1"]),
        row(&["月水金", "09:58", "スタッフ募集中", "", "2024/04/01", "2024/06/30", "1", ""]),
        row(&["月水金", "10:00", "期間外", "", "2024/06/01", "", "1", "1"]),
        row(&["2024/05/02", "10:00", "明日の告知", "", "", "", "1", "1"]),
        // Too short to be a rule
        row(&["2024/05/01", "10:00", "短い行"]),
    ])
}

fn tick() -> NaiveDateTime {
    // 2024-05-01 is a Wednesday
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn test_notify_pass_posts_due_rows() {
    let twitter = RecordingSender::new(Channel::Twitter, false);
    let facebook = RecordingSender::new(Channel::Facebook, false);
    let senders = ChannelSenders {
        twitter: Some(twitter.clone()),
        facebook: Some(facebook.clone()),
    };
    let matcher = ScheduleMatcher::new(MatcherConfig::default());

    let summary = run_notify_pass(&sheet(), &matcher, &senders, tick()).await.unwrap();
    assert_eq!(
        summary,
        NotifySummary {
            rows: 5,
            inert: 1,
            fired: 2,
            sent: 3,
            failed: 0,
            unconfigured: 0,
        }
    );

    assert_eq!(
        twitter.posts(),
        vec![
            ("チケット販売開始".to_string(), Some("https://pycon.jp/".to_string())),
            ("スタッフ募集中".to_string(), None),
        ]
    );
    assert_eq!(
        facebook.posts(),
        vec![("チケット販売開始".to_string(), Some("https://pycon.jp/".to_string()))]
    );
}

#[tokio::test]
async fn test_next_tick_does_not_repeat() {
    let twitter = RecordingSender::new(Channel::Twitter, false);
    let senders = ChannelSenders {
        twitter: Some(twitter.clone()),
        facebook: None,
    };
    let matcher = ScheduleMatcher::new(MatcherConfig::default());

    let next = tick() + chrono::Duration::minutes(5);
    let summary = run_notify_pass(&sheet(), &matcher, &senders, next).await.unwrap();

    assert_eq!(summary.fired, 0);
    assert!(twitter.posts().is_empty());
}

#[tokio::test]
async fn test_failing_channel_does_not_stop_others() {
    let twitter = RecordingSender::new(Channel::Twitter, true);
    let senders = ChannelSenders {
        twitter: Some(twitter.clone()),
        facebook: None,
    };
    let matcher = ScheduleMatcher::new(MatcherConfig::default());

    let summary = run_notify_pass(&sheet(), &matcher, &senders, tick()).await.unwrap();

    assert_eq!(summary.fired, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.sent, 0);
    // The facebook half of the first row has nowhere to go
    assert_eq!(summary.unconfigured, 1);
}

#[tokio::test]
async fn test_english_weekday_tokens() {
    let twitter = RecordingSender::new(Channel::Twitter, false);
    let senders = ChannelSenders {
        twitter: Some(twitter.clone()),
        facebook: None,
    };
    let matcher = ScheduleMatcher::new(MatcherConfig::for_locale(5, "en"));
    let sheet = MockSheet(vec![row(&["Mon, Wed", "10:00", "weekly", "", "", "", "1", ""])]);

    let summary = run_notify_pass(&sheet, &matcher, &senders, tick()).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(twitter.posts(), vec![("weekly".to_string(), None)]);
}

#[tokio::test]
async fn test_late_night_rule_fires_once_across_midnight() {
    let twitter = RecordingSender::new(Channel::Twitter, false);
    let senders = ChannelSenders {
        twitter: Some(twitter.clone()),
        facebook: None,
    };
    let matcher = ScheduleMatcher::new(MatcherConfig::default());
    let sheet = MockSheet(vec![
        row(&["2024/05/01", "23:58", "最終告知", "", "", "", "1", ""]),
        row(&["水", "23:59", "週次リマインド", "", "", "", "1", ""]),
    ]);

    // Every tick from 23:00 on Wednesday to 01:00 on Thursday
    let start = tick() + chrono::Duration::hours(13);
    let mut fired_at = Vec::new();
    for i in 0..=24 {
        let now = start + chrono::Duration::minutes(5 * i);
        let summary = run_notify_pass(&sheet, &matcher, &senders, now).await.unwrap();
        if summary.fired > 0 {
            fired_at.push((now, summary.fired));
        }
    }

    let midnight = NaiveDate::from_ymd_opt(2024, 5, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(fired_at, vec![(midnight, 2)]);
    assert_eq!(
        twitter.posts(),
        vec![
            ("最終告知".to_string(), None),
            ("週次リマインド".to_string(), None),
        ]
    );
}
