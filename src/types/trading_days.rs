use std::fmt;

use anyhow::{Result, bail};
use chrono::Weekday;

/// Set of weekdays an instrument can trade on, stored as a bitmask
/// indexed by days-from-Sunday (0 = Sunday .. 6 = Saturday).
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct TradingDays(u8);

impl TradingDays {
    pub const ALL: TradingDays = TradingDays(0b0111_1111);

    pub fn from_numbers(days: &[u8]) -> Result<Self> {
        let mut mask = 0u8;
        for &day in days {
            if day > 6 {
                bail!("weekday number must be 0 (Sunday) to 6 (Saturday), got {day}");
            }
            mask |= 1 << day;
        }

        Ok(Self(mask))
    }

    pub fn contains(self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_sunday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TradingDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<u32> = (0..7).filter(|day| self.0 & (1 << day) != 0).collect();
        write!(f, "TradingDays({days:?})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekdays_only() {
        let days = TradingDays::from_numbers(&[1, 2, 3, 4, 5]).unwrap();
        assert!(days.contains(Weekday::Mon));
        assert!(days.contains(Weekday::Fri));
        assert!(!days.contains(Weekday::Sat));
        assert!(!days.contains(Weekday::Sun));
    }

    #[test]
    fn rejects_out_of_range_day() {
        assert!(TradingDays::from_numbers(&[1, 7]).is_err());
    }

    #[test]
    fn empty_set() {
        assert!(TradingDays::from_numbers(&[]).unwrap().is_empty());
        assert!(!TradingDays::ALL.is_empty());
    }
}
