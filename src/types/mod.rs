pub mod clock_time;
pub mod instrument;
pub mod price;
pub mod quote;
pub mod trading_days;
pub mod trading_hours;
pub mod trading_status;
