use chrono::TimeDelta;

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// `{d}d {h}h {m}m` from one day upwards, `HH:MM:SS` below that.
///
/// Partial seconds round up, so a boundary still ahead never shows `00:00:00`.
pub fn format_countdown(delta: TimeDelta) -> String {
    let whole = delta.num_seconds();
    let total_seconds = if delta > TimeDelta::seconds(whole) { whole + 1 } else { whole }.max(0);

    if total_seconds >= SECONDS_PER_DAY {
        let days = total_seconds / SECONDS_PER_DAY;
        let hours = (total_seconds % SECONDS_PER_DAY) / 3600;
        let minutes = (total_seconds % 3600) / 60;
        return format!("{days}d {hours}h {minutes}m");
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
