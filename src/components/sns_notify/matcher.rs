//! Decides which channels a schedule row fires on for a given tick.
//!
//! Row layout (one sheet row, trailing empty cells may be missing):
//!
//! | # | cell                                   |
//! |---|----------------------------------------|
//! | 0 | recurrence: `YYYY/MM/DD` or weekdays   |
//! | 1 | time of day `HH:MM`                    |
//! | 2 | message                                |
//! | 3 | link                                   |
//! | 4 | valid from                             |
//! | 5 | valid until                            |
//! | 6 | twitter flag (`1` to post)             |
//! | 7 | facebook flag (`1` to post)            |

use super::models::{NotifyDecision, Recurrence, ScheduleRow, ValidityWindow};
use crate::utils::time::{parse_date, parse_time_of_day};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

/// Rows with fewer cells than this are ignored
pub const MIN_ROW_CELLS: usize = 7;

/// Default firing window width and tick period
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Cell value that enables a channel
const FLAG_ON: &str = "1";

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_token(day: Weekday, locale: &str) -> String {
    match day {
        Weekday::Mon => rust_i18n::t!("weekday.mon", locale = locale),
        Weekday::Tue => rust_i18n::t!("weekday.tue", locale = locale),
        Weekday::Wed => rust_i18n::t!("weekday.wed", locale = locale),
        Weekday::Thu => rust_i18n::t!("weekday.thu", locale = locale),
        Weekday::Fri => rust_i18n::t!("weekday.fri", locale = locale),
        Weekday::Sat => rust_i18n::t!("weekday.sat", locale = locale),
        Weekday::Sun => rust_i18n::t!("weekday.sun", locale = locale),
    }
    .to_string()
}

/// Immutable settings for the matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherConfig {
    pub interval_minutes: u32,
    /// Token that names each weekday inside a recurrence cell
    pub weekday_tokens: Vec<(Weekday, String)>,
}

impl MatcherConfig {
    pub fn new(interval_minutes: u32, weekday_tokens: Vec<(Weekday, String)>) -> Self {
        Self {
            interval_minutes,
            weekday_tokens,
        }
    }

    /// Weekday tokens taken from the given locale's translations
    pub fn for_locale(interval_minutes: u32, locale: &str) -> Self {
        let weekday_tokens = WEEKDAYS
            .iter()
            .map(|day| (*day, weekday_token(*day, locale)))
            .collect();

        Self::new(interval_minutes, weekday_tokens)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::for_locale(DEFAULT_INTERVAL_MINUTES, "ja")
    }
}

/// Pure decision logic over parsed schedule rows
#[derive(Debug, Clone)]
pub struct ScheduleMatcher {
    config: MatcherConfig,
}

impl ScheduleMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Parse the recurrence cell once into a date or a weekday set
    pub fn parse_recurrence(&self, cell: &str) -> Recurrence {
        if let Some(date) = parse_date(cell) {
            return Recurrence::AbsoluteDate(date);
        }

        let days = self
            .config
            .weekday_tokens
            .iter()
            .filter(|(_, token)| !token.is_empty() && cell.contains(token.as_str()))
            .map(|(day, _)| *day)
            .collect();

        Recurrence::WeekdaySet(days)
    }

    /// Parse raw sheet cells; rows that are too short are inert
    pub fn parse_row<S: AsRef<str>>(&self, cells: &[S]) -> Option<ScheduleRow> {
        if cells.len() < MIN_ROW_CELLS {
            return None;
        }

        let cell = |index: usize| cells.get(index).map(|c| c.as_ref()).unwrap_or("");
        let link = cell(3).trim();

        Some(ScheduleRow {
            recurrence: self.parse_recurrence(cell(0)),
            time_of_day: parse_time_of_day(cell(1)),
            message: cell(2).to_string(),
            link: (!link.is_empty()).then(|| link.to_string()),
            validity: ValidityWindow {
                from: parse_date(cell(4)),
                until: parse_date(cell(5)),
            },
            twitter: cell(6) == FLAG_ON,
            facebook: cell(7) == FLAG_ON,
        })
    }

    /// Channels a parsed row fires on at `now` (local wall clock)
    pub fn should_notify(&self, row: &ScheduleRow, now: NaiveDateTime) -> NotifyDecision {
        let Some(target) = self.firing_target(row, now) else {
            return NotifyDecision::NONE;
        };
        // A window opened before midnight still belongs to the day it was scheduled on
        if !row.validity.contains(target.date()) {
            return NotifyDecision::NONE;
        }

        NotifyDecision {
            twitter: row.twitter,
            facebook: row.facebook,
        }
    }

    /// Completeness gate plus `should_notify` over raw cells
    pub fn evaluate<S: AsRef<str>>(&self, cells: &[S], now: NaiveDateTime) -> NotifyDecision {
        match self.parse_row(cells) {
            Some(row) => self.should_notify(&row, now),
            None => NotifyDecision::NONE,
        }
    }

    /// Recurrence and time-of-day gate over raw cells
    pub fn is_target_date(&self, now: NaiveDateTime, recurrence: &str, time_of_day: &str) -> bool {
        let row = ScheduleRow {
            recurrence: self.parse_recurrence(recurrence),
            time_of_day: parse_time_of_day(time_of_day),
            message: String::new(),
            link: None,
            validity: ValidityWindow::default(),
            twitter: false,
            facebook: false,
        };
        self.firing_target(&row, now).is_some()
    }

    /// Scheduled instant whose window `[target, target + interval)` holds `now`
    ///
    /// Yesterday is checked as well, so a window that crosses midnight is not lost.
    fn firing_target(&self, row: &ScheduleRow, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let time_of_day = row.time_of_day?;
        let window = Duration::minutes(i64::from(self.config.interval_minutes));

        [Some(now.date()), now.date().pred_opt()]
            .into_iter()
            .flatten()
            .map(|day| day.and_time(time_of_day))
            .find(|target| {
                *target <= now
                    && now < *target + window
                    && row.recurrence.matches(target.date(), target.weekday())
            })
    }
}

/// Whether `today` lies inside the inclusive range given by two date cells
pub fn is_valid_period(valid_from: &str, valid_until: &str, today: NaiveDate) -> bool {
    ValidityWindow {
        from: parse_date(valid_from),
        until: parse_date(valid_until),
    }
    .contains(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn matcher() -> ScheduleMatcher {
        ScheduleMatcher::new(MatcherConfig::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn test_japanese_weekday_tokens() {
        let config = MatcherConfig::default();
        assert_eq!(config.interval_minutes, 5);
        assert_eq!(
            config.weekday_tokens,
            vec![
                (Weekday::Mon, "月".to_string()),
                (Weekday::Tue, "火".to_string()),
                (Weekday::Wed, "水".to_string()),
                (Weekday::Thu, "木".to_string()),
                (Weekday::Fri, "金".to_string()),
                (Weekday::Sat, "土".to_string()),
                (Weekday::Sun, "日".to_string()),
            ]
        );
    }

    #[test]
    fn test_valid_period_is_inclusive() {
        let from = "2024/04/01";
        let until = "2024/04/30";

        assert!(is_valid_period(from, until, date(2024, 4, 1)));
        assert!(is_valid_period(from, until, date(2024, 4, 15)));
        assert!(is_valid_period(from, until, date(2024, 4, 30)));
        assert!(!is_valid_period(from, until, date(2024, 5, 1)));
        assert!(!is_valid_period(from, until, date(2024, 3, 31)));
    }

    #[test]
    fn test_valid_period_missing_bounds_are_unbounded() {
        assert!(is_valid_period("", "2024/04/30", date(1999, 1, 1)));
        assert!(is_valid_period("", "2024/04/30", date(2024, 4, 30)));
        assert!(!is_valid_period("", "2024/04/30", date(2024, 5, 1)));

        assert!(is_valid_period("2024/04/01", "", date(2999, 12, 31)));
        assert!(is_valid_period("not a date", "garbage", date(2024, 4, 1)));
    }

    #[test]
    fn test_absolute_date_fires_within_interval() {
        let m = matcher();

        for minute in 0..5 {
            assert!(
                m.is_target_date(at(2024, 5, 1, 9, minute), "2024/05/01", "09:00"),
                "should fire at 09:0{}",
                minute
            );
        }
        assert!(!m.is_target_date(at(2024, 5, 1, 9, 5), "2024/05/01", "09:00"));
        assert!(!m.is_target_date(at(2024, 5, 1, 8, 59), "2024/05/01", "09:00"));
        assert!(!m.is_target_date(at(2024, 5, 2, 9, 0), "2024/05/01", "09:00"));
    }

    #[test]
    fn test_last_second_of_window_still_fires() {
        let m = matcher();
        let now = date(2024, 5, 1).and_hms_opt(9, 4, 59).unwrap();
        assert!(m.is_target_date(now, "2024/05/01", "09:00"));
    }

    #[test]
    fn test_weekday_tokens() {
        let m = matcher();

        // 2024-05-06 is a Monday
        let monday = at(2024, 5, 6, 9, 0);
        let tuesday = at(2024, 5, 7, 9, 0);
        let wednesday = at(2024, 5, 8, 9, 0);
        let friday = at(2024, 5, 10, 9, 0);
        let sunday = at(2024, 5, 12, 9, 0);

        assert!(m.is_target_date(monday, "月水金", "09:00"));
        assert!(m.is_target_date(wednesday, "月水金", "09:00"));
        assert!(m.is_target_date(friday, "月水金", "09:00"));
        assert!(!m.is_target_date(tuesday, "月水金", "09:00"));
        assert!(!m.is_target_date(sunday, "月水金", "09:00"));

        // Right day, wrong time
        assert!(!m.is_target_date(at(2024, 5, 6, 10, 0), "月水金", "09:00"));
    }

    #[test]
    fn test_recurrence_parsed_once() {
        let m = matcher();
        assert_eq!(
            m.parse_recurrence("2024/05/01"),
            Recurrence::AbsoluteDate(date(2024, 5, 1))
        );
        assert_eq!(
            m.parse_recurrence("毎週 火・木"),
            Recurrence::WeekdaySet(vec![Weekday::Tue, Weekday::Thu])
        );
        assert_eq!(m.parse_recurrence(""), Recurrence::WeekdaySet(vec![]));
    }

    #[test]
    fn test_full_row_fires_flagged_channels() {
        let m = matcher();
        let row = ["2024/01/01", "09:00", "hello", "http://x", "", "", "1", "0"];

        let decision = m.evaluate(&row, at(2024, 1, 1, 9, 2));
        assert_eq!(
            decision,
            NotifyDecision {
                twitter: true,
                facebook: false
            }
        );
    }

    #[test]
    fn test_short_row_is_inert() {
        let m = matcher();
        let row = ["2024/01/01", "09:00", "hello", "http://x", ""];

        assert!(m.evaluate(&row, at(2024, 1, 1, 9, 0)).is_empty());
        assert!(m.parse_row(&row).is_none());
    }

    #[test]
    fn test_seven_cell_row_has_no_facebook_flag() {
        let m = matcher();
        let row = ["2024/01/01", "09:00", "hello", "", "", "", "1"];

        let parsed = m.parse_row(&row).unwrap();
        assert_eq!(parsed.link, None);
        assert!(parsed.twitter);
        assert!(!parsed.facebook);
    }

    #[test]
    fn test_flags_must_be_exactly_one() {
        let m = matcher();
        let row = ["2024/01/01", "09:00", "hello", "", "", "", " 1", "yes"];

        assert!(m.evaluate(&row, at(2024, 1, 1, 9, 0)).is_empty());
    }

    #[test]
    fn test_out_of_period_row_does_not_fire() {
        let m = matcher();
        let row = ["月", "09:00", "hello", "", "2024/05/07", "2024/05/31", "1", "1"];

        // Monday before the period starts
        assert!(m.evaluate(&row, at(2024, 5, 6, 9, 0)).is_empty());
        // Monday inside the period
        assert_eq!(
            m.evaluate(&row, at(2024, 5, 13, 9, 0)),
            NotifyDecision {
                twitter: true,
                facebook: true
            }
        );
    }

    #[test]
    fn test_unparsable_time_never_fires() {
        let m = matcher();
        let row = ["2024/01/01", "朝", "hello", "", "", "", "1", "1"];

        assert!(m.evaluate(&row, at(2024, 1, 1, 9, 0)).is_empty());
        assert!(m.evaluate(&row, at(2024, 1, 1, 0, 0)).is_empty());
    }

    #[test]
    fn test_wider_interval() {
        let m = ScheduleMatcher::new(MatcherConfig::for_locale(15, "ja"));
        assert!(m.is_target_date(at(2024, 5, 1, 9, 14), "2024/05/01", "09:00"));
        assert!(!m.is_target_date(at(2024, 5, 1, 9, 15), "2024/05/01", "09:00"));
    }

    #[test]
    fn test_english_tokens() {
        let m = ScheduleMatcher::new(MatcherConfig::for_locale(5, "en"));
        // 2024-05-07 is a Tuesday
        assert!(m.is_target_date(at(2024, 5, 7, 18, 30), "Tue, Thu", "18:30"));
        assert!(!m.is_target_date(at(2024, 5, 6, 18, 30), "Tue, Thu", "18:30"));
    }

    /// Every aligned tick from `start` for `days` days
    fn ticks(start: NaiveDateTime, interval: u32, days: i64) -> Vec<NaiveDateTime> {
        let count = days * 24 * 60 / i64::from(interval);
        (0..=count)
            .map(|i| start + Duration::minutes(i * i64::from(interval)))
            .collect()
    }

    fn firing_ticks(m: &ScheduleMatcher, row: &[&str], ticks: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
        ticks
            .iter()
            .copied()
            .filter(|tick| !m.evaluate(row, *tick).is_empty())
            .collect()
    }

    #[test]
    fn test_window_crossing_midnight_fires_once() {
        let m = matcher();
        let ticks = ticks(at(2024, 5, 1, 0, 0), 5, 2);

        for time in ["23:56", "23:58", "23:59"] {
            let row = ["2024/05/01", time, "late", "", "", "", "1", "1"];
            assert_eq!(
                firing_ticks(&m, &row, &ticks),
                vec![at(2024, 5, 2, 0, 0)],
                "row at {}",
                time
            );
        }

        // The window opened on the scheduled day, so its weekday counts
        // 2024-05-01 is a Wednesday, 2024-05-02 a Thursday
        let row = ["水", "23:58", "late", "", "", "", "1", ""];
        assert_eq!(firing_ticks(&m, &row, &ticks), vec![at(2024, 5, 2, 0, 0)]);
        let row = ["木", "23:58", "late", "", "", "", "1", ""];
        assert_eq!(firing_ticks(&m, &row, &ticks), vec![at(2024, 5, 3, 0, 0)]);
    }

    #[test]
    fn test_every_rule_fires_on_exactly_one_tick_per_day() {
        let m = matcher();
        // Wednesday through Thursday midnight, with both day boundaries
        let ticks = ticks(at(2024, 5, 1, 0, 0), 5, 1);

        for hour in 0..24 {
            for minute in [0, 1, 4, 5, 57] {
                let time = format!("{:02}:{:02}", hour, minute);

                let absolute = ["2024/05/01", time.as_str(), "msg", "", "", "", "1", "1"];
                assert_eq!(
                    firing_ticks(&m, &absolute, &ticks).len(),
                    1,
                    "absolute rule at {}",
                    time
                );

                let weekday = ["水", time.as_str(), "msg", "", "", "", "1", "1"];
                assert_eq!(
                    firing_ticks(&m, &weekday, &ticks).len(),
                    1,
                    "weekday rule at {}",
                    time
                );
            }
        }
    }

    #[test]
    fn test_validity_follows_scheduled_day() {
        let m = matcher();
        let row = ["水", "23:58", "late", "", "", "2024/05/01", "1", "1"];

        // Fires just after midnight although the period ended the day before
        assert!(!m.evaluate(&row, at(2024, 5, 2, 0, 0)).is_empty());
    }
}
