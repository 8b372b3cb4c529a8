use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    /// Accepts only finite, strictly positive values as quoted by a feed.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Price(value))
    }

    fn decimals(self) -> usize {
        if self.0 < 10.0 { 4 } else { 2 }
    }
}

/// Fixed decimals with `,` thousands separators, e.g. `5,432.10` or `1.0834`.
impl fmt::Display for Price {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = format!("{:.*}", self.decimals(), self.0);
        let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (index, digit) in integer.chars().enumerate() {
            if index > 0 && (integer.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        if fraction.is_empty() {
            write!(formatter, "{grouped}")
        } else {
            write!(formatter, "{grouped}.{fraction}")
        }
    }
}
