use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::clock_time::ClockTime;

/// An instant seen as wall-clock time in an exchange's zone.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocalClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl LocalClock {
    pub fn at(timezone: Tz, now: DateTime<Utc>) -> Self {
        let local = now.with_timezone(&timezone);
        Self {
            date: local.date_naive(),
            time: local.time(),
        }
    }
}

/// Resolves a local wall-clock time on a concrete date to an absolute instant.
///
/// Ambiguous times (clocks going back) take the first occurrence; times that
/// do not exist (clocks going forward) move past the gap.
pub fn resolve_local(timezone: Tz, date: NaiveDate, time: ClockTime) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::new(date, time.as_naive_time());

    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _latest) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => timezone
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
