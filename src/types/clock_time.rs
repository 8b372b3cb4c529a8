use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};

/// Wall-clock time of day (hour:minute) in an instrument's own zone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 {
            bail!("hour must be 0-23, got {hour}");
        }
        if minute > 59 {
            bail!("minute must be 0-59, got {minute}");
        }

        Ok(Self { hour, minute })
    }

    pub fn as_naive_time(self) -> NaiveTime {
        // hour and minute are range-checked in `new`
        NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ClockTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid clock time \"{s}\", expected HH:MM"))?;

        let hour: u8 = hour
            .parse()
            .with_context(|| format!("invalid hour in clock time \"{s}\""))?;
        let minute: u8 = minute
            .parse()
            .with_context(|| format!("invalid minute in clock time \"{s}\""))?;

        Self::new(hour, minute).with_context(|| format!("invalid clock time \"{s}\""))
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hour_and_minute() {
        let time: ClockTime = "09:30".parse().unwrap();
        assert_eq!(time, ClockTime::new(9, 30).unwrap());
        assert_eq!(time.as_naive_time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(time.to_string(), "09:30");
    }

    #[test]
    fn rejects_malformed_times() {
        assert!("0930".parse::<ClockTime>().is_err());
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("12:60".parse::<ClockTime>().is_err());
        assert!("ab:cd".parse::<ClockTime>().is_err());
    }

    #[test]
    fn orders_by_time_of_day() {
        let open: ClockTime = "09:30".parse().unwrap();
        let close: ClockTime = "16:00".parse().unwrap();
        assert!(open < close);
        assert_eq!(close.as_naive_time(), NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }
}
