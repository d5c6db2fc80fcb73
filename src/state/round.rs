//! Round clock helpers derived from the round start and duration.

use time::OffsetDateTime;

/// Round starts below this value are taken as seconds, above as milliseconds.
const SECONDS_THRESHOLD: f64 = 10_000_000_000.0;

/// Percentage (0..=100) of the current round that has elapsed.
///
/// `None` when the round start or the round duration is unknown or zero.
pub fn round_progress(round_start: Option<f64>, round_time: Option<u64>, now_secs: f64) -> Option<u8> {
    let start = round_start.filter(|start| *start != 0.0)?;
    let round_time = round_time.filter(|time| *time != 0)?;

    let ratio = ((now_secs - start) / round_time as f64).clamp(0.0, 1.0);
    Some((ratio * 100.0).floor() as u8)
}

/// Time since the round started as `MM:SS`.
///
/// A start in the future renders as `00:00`.
pub fn format_elapsed(round_start: Option<f64>, now_ms: f64) -> Option<String> {
    let start = round_start.filter(|start| *start != 0.0)?;
    let start_ms = if start < SECONDS_THRESHOLD {
        start * 1000.0
    } else {
        start
    };

    let diff = now_ms - start_ms;
    if diff < 0.0 {
        return Some("00:00".to_string());
    }

    let total_secs = (diff / 1000.0).floor() as u64;
    Some(format!("{:02}:{:02}", total_secs / 60, total_secs % 60))
}

/// Current wall clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
