pub mod calculator;
pub mod countdown;
pub mod zone;
