use chrono::{NaiveDate, NaiveTime, Weekday};
use std::fmt;

/// Social channels a schedule row can post to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Twitter,
    Facebook,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Twitter => "twitter",
            Channel::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// When a row fires: one calendar date or a set of weekdays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    AbsoluteDate(NaiveDate),
    WeekdaySet(Vec<Weekday>),
}

impl Recurrence {
    /// Whether `date` satisfies the rule
    pub fn matches(&self, date: NaiveDate, weekday: Weekday) -> bool {
        match self {
            Recurrence::AbsoluteDate(target) => *target == date,
            Recurrence::WeekdaySet(days) => days.contains(&weekday),
        }
    }
}

/// Inclusive date range in which a row may fire; `None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidityWindow {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl ValidityWindow {
    pub fn contains(&self, today: NaiveDate) -> bool {
        self.from.map_or(true, |from| from <= today) && self.until.map_or(true, |until| today <= until)
    }
}

/// One notification rule parsed from a sheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub recurrence: Recurrence,
    /// `None` when the cell is not an HH:MM time; such a row never fires
    pub time_of_day: Option<NaiveTime>,
    pub message: String,
    pub link: Option<String>,
    pub validity: ValidityWindow,
    pub twitter: bool,
    pub facebook: bool,
}

/// Channels that fire for one row on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyDecision {
    pub twitter: bool,
    pub facebook: bool,
}

impl NotifyDecision {
    /// Decision that fires nothing
    pub const NONE: NotifyDecision = NotifyDecision {
        twitter: false,
        facebook: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.twitter && !self.facebook
    }

    /// Channels to send to, in a fixed order
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = Vec::new();
        if self.twitter {
            channels.push(Channel::Twitter);
        }
        if self.facebook {
            channels.push(Channel::Facebook);
        }
        channels
    }
}
