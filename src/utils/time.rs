use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Date layouts accepted in schedule cells
const DATE_FORMATS: [&str; 4] = ["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse an HH:MM cell into a time of day
pub fn parse_time_of_day(time_str: &str) -> Option<NaiveTime> {
    let (hour, minute) = parse_time(time_str)?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parse a calendar date written the way the schedule sheet writes them
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_str, format).ok())
}

/// Next wall-clock tick aligned to `interval_minutes` past midnight
pub fn next_tick(now: &NaiveDateTime, interval_minutes: u32) -> Option<NaiveDateTime> {
    let interval = i64::from(interval_minutes.max(1));
    let minutes_today = i64::from(now.hour() * 60 + now.minute());
    let next_minutes = (minutes_today / interval + 1) * interval;

    now.date()
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::minutes(next_minutes))
}

/// Latest tick at or before `now`
pub fn current_tick(now: &NaiveDateTime, interval_minutes: u32) -> Option<NaiveDateTime> {
    let interval = i64::from(interval_minutes.max(1));
    let minutes_today = i64::from(now.hour() * 60 + now.minute());

    now.date()
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::minutes(minutes_today / interval * interval))
}

/// Calculate the wait duration until the next tick in seconds
pub fn calculate_wait_duration(now: &NaiveDateTime, next_time: &NaiveDateTime) -> u64 {
    let seconds = next_time.signed_duration_since(*now).num_seconds();

    // A tick that is already due still waits a second so the loop cannot spin
    if seconds <= 0 {
        return 1;
    }

    seconds as u64
}
