//! Relative "time ago" parsing.
//!
//! Turns listing-card text such as `"3 hours ago"` into a second count.
//! A year is 365 days; no calendar or locale awareness.

use std::sync::LazyLock;

use regex::Regex;

use jobwatch_common::JobWatchError;

static TIME_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s+(second|minute|hour|day|week|year)s?\s+ago\s*$").unwrap()
});

pub const MINUTE: u64 = 60;
pub const HOUR: u64 = 60 * MINUTE;
pub const DAY: u64 = 24 * HOUR;
pub const WEEK: u64 = 7 * DAY;
pub const YEAR: u64 = 365 * DAY;

fn unit_seconds(unit: &str) -> u64 {
    match unit {
        "second" => 1,
        "minute" => MINUTE,
        "hour" => HOUR,
        "day" => DAY,
        "week" => WEEK,
        // The grammar admits nothing else.
        _ => YEAR,
    }
}

/// Parse `"<N> <unit>[s] ago"` into seconds.
pub fn parse(text: &str) -> Result<u64, JobWatchError> {
    let malformed = || JobWatchError::MalformedTimeText(text.to_string());

    let caps = TIME_AGO.captures(text).ok_or_else(malformed)?;
    let count: u64 = caps[1].parse().map_err(|_| malformed())?;
    let unit = caps[2].to_lowercase();

    count.checked_mul(unit_seconds(&unit)).ok_or_else(malformed)
}
