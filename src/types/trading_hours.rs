use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::types::clock_time::ClockTime;
use crate::types::instrument::normalize_symbol;
use crate::types::trading_days::TradingDays;

/// Raw schedule block as written in the instrument table.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone name, e.g. "America/New_York"
    pub timezone: String,

    /// Weekday numbers, 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub trading_days: Vec<u8>,

    pub kind: SessionKindConfig,

    #[serde(default)]
    pub regular_open: Option<ClockTime>,

    #[serde(default)]
    pub regular_close: Option<ClockTime>,

    /// Lunch break for regular sessions, maintenance gap for nearly continuous ones
    #[serde(default)]
    pub intraday_break: Option<BreakConfig>,

    /// Local dates the market stays shut even though the weekday trades
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKindConfig {
    #[serde(rename = "always_24x7")]
    Always24x7,
    NearlyContinuous,
    RegularSession,
}

#[derive(Debug, Copy, Clone, Deserialize)]
pub struct BreakConfig {
    pub start: ClockTime,
    pub end: ClockTime,
}

/// Recurring closed interval `[start, end)` inside an otherwise open day.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntradayBreak {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl IntradayBreak {
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self> {
        if start >= end {
            bail!("intraday break start {start} must be before end {end}");
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start.as_naive_time() && time < self.end.as_naive_time()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionKind {
    Always24x7,
    /// Open from `open` on the first trading day of the week through `close`
    /// on the last one, shut only for `maintenance` each day.
    NearlyContinuous {
        open: ClockTime,
        close: ClockTime,
        maintenance: Option<IntradayBreak>,
    },
    RegularSession {
        open: ClockTime,
        close: ClockTime,
        lunch: Option<IntradayBreak>,
    },
}

/// Validated, immutable trading schedule for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentSchedule {
    symbol: String,
    timezone: Tz,
    trading_days: TradingDays,
    kind: SessionKind,
    holidays: BTreeSet<NaiveDate>,
}

impl InstrumentSchedule {
    pub fn new(
        symbol: &str,
        timezone: Tz,
        trading_days: TradingDays,
        kind: SessionKind,
        holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<Self> {
        let schedule = Self {
            symbol: normalize_symbol(symbol),
            timezone,
            trading_days,
            kind,
            holidays: holidays.into_iter().collect(),
        };
        schedule.validate()?;

        Ok(schedule)
    }

    pub fn from_config(symbol: &str, config: &ScheduleConfig) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| anyhow!("unknown timezone \"{}\"", config.timezone))?;

        let intraday_break = config
            .intraday_break
            .map(|b| IntradayBreak::new(b.start, b.end))
            .transpose()?;

        let kind = match config.kind {
            SessionKindConfig::Always24x7 => {
                if config.regular_open.is_some() || config.regular_close.is_some() {
                    bail!("always_24x7 session must not define regular_open/regular_close");
                }
                if intraday_break.is_some() {
                    bail!("always_24x7 session must not define an intraday_break");
                }
                SessionKind::Always24x7
            }
            SessionKindConfig::NearlyContinuous => {
                let (open, close) = required_times(config)?;
                SessionKind::NearlyContinuous {
                    open,
                    close,
                    maintenance: intraday_break,
                }
            }
            SessionKindConfig::RegularSession => {
                let (open, close) = required_times(config)?;
                SessionKind::RegularSession {
                    open,
                    close,
                    lunch: intraday_break,
                }
            }
        };

        let trading_days = match kind {
            SessionKind::Always24x7 => TradingDays::ALL,
            _ => TradingDays::from_numbers(&config.trading_days)?,
        };

        Self::new(
            symbol,
            timezone,
            trading_days,
            kind,
            config.holidays.iter().copied(),
        )
    }

    fn validate(&self) -> Result<()> {
        match self.kind {
            SessionKind::Always24x7 => {
                if self.trading_days != TradingDays::ALL {
                    bail!("always_24x7 session trades every day");
                }
                if !self.holidays.is_empty() {
                    bail!("always_24x7 session cannot have holidays");
                }
            }
            SessionKind::NearlyContinuous { .. } => {
                if self.trading_days.is_empty() {
                    bail!("trading_days must not be empty");
                }
                if self.trading_days == TradingDays::ALL {
                    bail!("nearly continuous session needs at least one non-trading day");
                }
            }
            SessionKind::RegularSession { open, close, lunch } => {
                if self.trading_days.is_empty() {
                    bail!("trading_days must not be empty");
                }
                if open >= close {
                    bail!("regular_open {open} must be before regular_close {close}");
                }
                if let Some(lunch) = lunch {
                    if lunch.start < open || lunch.end > close {
                        bail!("lunch break {}-{} lies outside the session", lunch.start, lunch.end);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn kind(&self) -> &SessionKind {
        &self.kind
    }

    pub fn regular_open(&self) -> Option<ClockTime> {
        match self.kind {
            SessionKind::Always24x7 => None,
            SessionKind::NearlyContinuous { open, .. } | SessionKind::RegularSession { open, .. } => {
                Some(open)
            }
        }
    }

    /// Local calendar date on which the market can be open at all.
    pub fn is_trading_date(&self, date: NaiveDate) -> bool {
        self.trading_days.contains(date.weekday()) && !self.holidays.contains(&date)
    }

    /// Last trading date before a non-trading one (conventionally Friday).
    pub fn is_week_close_date(&self, date: NaiveDate) -> bool {
        self.is_trading_date(date)
            && date
                .checked_add_days(Days::new(1))
                .is_some_and(|next| !self.is_trading_date(next))
    }

    /// First trading date after a non-trading one (conventionally Sunday).
    pub fn is_week_open_date(&self, date: NaiveDate) -> bool {
        self.is_trading_date(date)
            && date
                .checked_sub_days(Days::new(1))
                .is_some_and(|previous| !self.is_trading_date(previous))
    }
}

fn required_times(config: &ScheduleConfig) -> Result<(ClockTime, ClockTime)> {
    let open = config
        .regular_open
        .context("regular_open is required for this session kind")?;
    let close = config
        .regular_close
        .context("regular_close is required for this session kind")?;

    Ok((open, close))
}
