use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

pub const DEFAULT_ROLL_DAYS_BEFORE: i64 = 7;

/// Quarterly contract months (March, June, September, December) and their
/// exchange month codes.
const QUARTERLY_MONTHS: [(u32, char); 4] = [(3, 'H'), (6, 'M'), (9, 'U'), (12, 'Z')];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuturesContract {
    pub root: String,
    pub month: u32,
    pub year: i32,
}

impl FuturesContract {
    pub fn month_code(&self) -> char {
        QUARTERLY_MONTHS
            .iter()
            .find(|(month, _)| *month == self.month)
            .map(|(_, code)| *code)
            .unwrap_or('?')
    }

    pub fn expiry(&self) -> Option<NaiveDate> {
        third_friday(self.year, self.month)
    }
}

impl fmt::Display for FuturesContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:02}",
            self.root,
            self.month_code(),
            self.year.rem_euclid(100)
        )
    }
}

/// Third Friday of the month, the standard quarterly expiry day.
pub fn third_friday(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Fri, 3)
}

/// Contract to track for `root` on `today`: the nearest quarterly month whose
/// expiry is still at least `roll_days_before` days away, otherwise the one after it.
pub fn active_contract(root: &str, today: NaiveDate, roll_days_before: i64) -> FuturesContract {
    let (month, year) = nearest_quarterly_month(today.month(), today.year());

    let days_until_expiry = third_friday(year, month)
        .map(|expiry| (expiry - today).num_days())
        .unwrap_or(i64::MIN);

    let (month, year) = if days_until_expiry >= roll_days_before {
        (month, year)
    } else {
        following_quarterly_month(month, year)
    };

    tracing::trace!(root, %today, days_until_expiry, month, year, "resolved futures contract");

    FuturesContract {
        root: root.to_uppercase(),
        month,
        year,
    }
}

fn nearest_quarterly_month(month: u32, year: i32) -> (u32, i32) {
    QUARTERLY_MONTHS
        .iter()
        .map(|(quarterly, _)| *quarterly)
        .find(|quarterly| *quarterly >= month)
        .map(|quarterly| (quarterly, year))
        .unwrap_or((QUARTERLY_MONTHS[0].0, year + 1))
}

fn following_quarterly_month(month: u32, year: i32) -> (u32, i32) {
    if month >= 12 {
        (QUARTERLY_MONTHS[0].0, year + 1)
    } else {
        nearest_quarterly_month(month + 1, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn third_friday_of_known_months() {
        assert_eq!(third_friday(2025, 6), Some(date(2025, 6, 20)));
        assert_eq!(third_friday(2025, 12), Some(date(2025, 12, 19)));
        // month starting on a Saturday
        assert_eq!(third_friday(2026, 8), Some(date(2026, 8, 21)));
        // month starting on a Friday
        assert_eq!(third_friday(2026, 5), Some(date(2026, 5, 15)));
    }

    #[test]
    fn keeps_nearest_contract_ten_days_before_expiry() {
        let contract = active_contract("ES", date(2025, 6, 10), DEFAULT_ROLL_DAYS_BEFORE);
        assert_eq!(contract.to_string(), "ESM25");
    }

    #[test]
    fn rolls_three_days_before_expiry() {
        let contract = active_contract("ES", date(2025, 6, 17), DEFAULT_ROLL_DAYS_BEFORE);
        assert_eq!(contract.to_string(), "ESU25");
    }

    #[test]
    fn off_cycle_month_picks_next_quarter() {
        let contract = active_contract("nq", date(2025, 7, 1), DEFAULT_ROLL_DAYS_BEFORE);
        assert_eq!(contract.to_string(), "NQU25");
        assert_eq!(contract.expiry(), Some(date(2025, 9, 19)));
    }

    #[test]
    fn december_roll_crosses_the_year() {
        let contract = active_contract("ES", date(2025, 12, 16), DEFAULT_ROLL_DAYS_BEFORE);
        assert_eq!(contract.to_string(), "ESH26");
    }

    #[test]
    fn after_expiry_in_contract_month_rolls() {
        let contract = active_contract("ES", date(2025, 3, 28), DEFAULT_ROLL_DAYS_BEFORE);
        assert_eq!(contract.to_string(), "ESM25");
    }

    #[test]
    fn roll_threshold_is_configurable() {
        let contract = active_contract("ES", date(2025, 6, 10), 14);
        assert_eq!(contract.to_string(), "ESU25");
    }
}
