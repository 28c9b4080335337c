use crate::clock::format_day;
use time::Date;

/// Active date scoping. Exact-day and rolling-window filters replace each
/// other, so at most one is ever active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    None,
    Date(Date),
    LastDays(u32),
}

impl Filter {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn days(&self) -> Option<u32> {
        match self {
            Self::LastDays(days) => Some(*days),
            _ => None,
        }
    }
}

/// Inclusive `[start, end]` pair of calendar days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
    start_key: String,
    end_key: String,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self {
            start,
            end,
            start_key: format_day(start),
            end_key: format_day(end),
        }
    }

    pub fn single(day: Date) -> Self {
        Self::new(day, day)
    }

    pub fn start_key(&self) -> &str {
        &self.start_key
    }

    pub fn end_key(&self) -> &str {
        &self.end_key
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    /// `YYYY-MM-DD` strings order the same lexically and by calendar.
    pub fn contains_key(&self, day: &str) -> bool {
        self.start_key.as_str() <= day && day <= self.end_key.as_str()
    }

    /// Inclusive length in days, never below one.
    pub fn len_days(&self) -> i64 {
        ((self.end - self.start).whole_days() + 1).max(1)
    }
}
