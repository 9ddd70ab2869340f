//! # Clock
//!
//! Source of "now" for dates, remark timestamps and export file names.

use chrono::{DateTime, Days, NaiveDate, Utc};
use std::fmt::Debug;

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `date` moved forward by `days`, saturating at the calendar end.
#[must_use]
pub fn days_after(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_today() {
        let at = Utc
            .with_ymd_and_hms(2026, 10, 14, 23, 59, 0)
            .single()
            .expect("valid timestamp");
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date"));
    }

    #[test]
    fn days_after_crosses_month_end() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 29).expect("valid date");
        assert_eq!(
            days_after(start, 5),
            NaiveDate::from_ymd_opt(2026, 11, 3).expect("valid date")
        );
        assert_eq!(days_after(NaiveDate::MAX, 1), NaiveDate::MAX);
    }
}
