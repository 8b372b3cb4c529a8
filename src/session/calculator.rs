use chrono::{DateTime, NaiveDate, Utc};

use crate::session::zone::{LocalClock, resolve_local};
use crate::types::clock_time::ClockTime;
use crate::types::trading_hours::{InstrumentSchedule, SessionKind};
use crate::types::trading_status::{Countdown, TradingStatus};

/// Upper bound on how far ahead a boundary search walks, one day at a time.
const SEARCH_HORIZON_DAYS: u32 = 366;

/// Open/closed status of `schedule` at `now`, with the time left until the
/// next boundary. Pure: the result depends only on its two arguments.
pub fn evaluate(schedule: &InstrumentSchedule, now: DateTime<Utc>) -> TradingStatus {
    let clock = LocalClock::at(schedule.timezone(), now);

    if !schedule.is_trading_date(clock.date) {
        return TradingStatus::closed(next_trading_open(schedule, clock.date, now));
    }

    match *schedule.kind() {
        SessionKind::Always24x7 => TradingStatus::open(None),

        SessionKind::NearlyContinuous {
            open,
            close,
            maintenance,
        } => {
            if schedule.is_week_close_date(clock.date) && clock.time >= close.as_naive_time() {
                return TradingStatus::closed(next_trading_open(schedule, clock.date, now));
            }

            if schedule.is_week_open_date(clock.date) && clock.time < open.as_naive_time() {
                return TradingStatus::closed(next_boundary(schedule, clock.date, open, now, |d| {
                    schedule.is_trading_date(d)
                }));
            }

            if let Some(maintenance) = maintenance {
                if maintenance.contains(clock.time) {
                    return TradingStatus::closed(next_boundary(
                        schedule,
                        clock.date,
                        maintenance.end,
                        now,
                        |d| schedule.is_trading_date(d),
                    ));
                }
            }

            TradingStatus::open(next_boundary(schedule, clock.date, close, now, |d| {
                schedule.is_week_close_date(d)
            }))
        }

        SessionKind::RegularSession { open, close, lunch } => {
            let trading_date = |d: NaiveDate| schedule.is_trading_date(d);

            if let Some(lunch) = lunch {
                if lunch.contains(clock.time) {
                    return TradingStatus::closed(next_boundary(
                        schedule,
                        clock.date,
                        lunch.end,
                        now,
                        trading_date,
                    ));
                }
            }

            if clock.time >= open.as_naive_time() && clock.time < close.as_naive_time() {
                return TradingStatus::open(next_boundary(
                    schedule,
                    clock.date,
                    close,
                    now,
                    trading_date,
                ));
            }

            if clock.time < open.as_naive_time() {
                return TradingStatus::closed(next_boundary(
                    schedule,
                    clock.date,
                    open,
                    now,
                    trading_date,
                ));
            }

            TradingStatus::closed(next_trading_open(schedule, clock.date, now))
        }
    }
}

/// Countdown to `regular_open` on the first trading date strictly after `date`.
fn next_trading_open(
    schedule: &InstrumentSchedule,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Option<Countdown> {
    let open = schedule.regular_open()?;
    let start = date.succ_opt()?;

    next_boundary(schedule, start, open, now, |d| schedule.is_trading_date(d))
}

/// Walks forward one calendar day at a time from `start`, resolving `time` on
/// every accepted date against the concrete zone offset, until the resulting
/// instant lies strictly after `now`.
fn next_boundary(
    schedule: &InstrumentSchedule,
    start: NaiveDate,
    time: ClockTime,
    now: DateTime<Utc>,
    accept: impl Fn(NaiveDate) -> bool,
) -> Option<Countdown> {
    let mut date = start;

    for _ in 0..SEARCH_HORIZON_DAYS {
        if accept(date) {
            let countdown = resolve_local(schedule.timezone(), date, time)
                .and_then(|target| Countdown::new(target - now));
            if countdown.is_some() {
                return countdown;
            }
        }
        date = date.succ_opt()?;
    }

    tracing::debug!(
        symbol = schedule.symbol(),
        %start,
        %time,
        "no boundary found within search horizon"
    );
    None
}
