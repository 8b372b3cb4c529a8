use std::fmt;

use chrono::TimeDelta;

/// Strictly positive time left until the next open/close boundary.
///
/// A non-positive delta cannot be constructed, so a stale or inconsistent
/// boundary never reaches the renderer as a negative duration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Countdown(TimeDelta);

impl Countdown {
    pub fn new(delta: TimeDelta) -> Option<Self> {
        (delta > TimeDelta::zero()).then_some(Self(delta))
    }

    pub fn as_delta(self) -> TimeDelta {
        self.0
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::session::countdown::format_countdown(self.as_delta()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TradingStatus {
    pub is_open: bool,
    pub next_boundary: Option<Countdown>,
}

impl TradingStatus {
    pub fn open(next_boundary: Option<Countdown>) -> Self {
        Self {
            is_open: true,
            next_boundary,
        }
    }

    pub fn closed(next_boundary: Option<Countdown>) -> Self {
        Self {
            is_open: false,
            next_boundary,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_open { "OPEN" } else { "CLOSED" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_countdown_is_rejected() {
        assert!(Countdown::new(TimeDelta::zero()).is_none());
        assert!(Countdown::new(TimeDelta::seconds(-5)).is_none());
        assert!(Countdown::new(TimeDelta::seconds(1)).is_some());
    }
}
