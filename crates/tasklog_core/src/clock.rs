use crate::error::AppError;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Source of "today" and "now" for everything date-dependent.
pub trait Clock {
    fn today(&self) -> Date;

    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(local_offset()).date()
    }

    fn now_millis(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    pub today: Date,
    pub now_millis: i64,
}

impl FixedClock {
    pub fn new(today: Date, now_millis: i64) -> Self {
        Self { today, now_millis }
    }

    /// Pins the day with "now" at midnight UTC of that day.
    pub fn on_day(today: Date) -> Self {
        let now_millis = (today.midnight().assume_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        Self { today, now_millis }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.today
    }

    fn now_millis(&self) -> i64 {
        self.now_millis
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> Date {
        (**self).today()
    }

    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn format_day(day: Date) -> String {
    day.format(DAY_FORMAT)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", day.year(), day.month() as u8, day.day()))
}

pub fn parse_day(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), DAY_FORMAT)
        .map_err(|_| AppError::invalid_input(format!("date must be YYYY-MM-DD: {raw}")))
}
