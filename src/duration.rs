// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Go-style duration strings.
//!
//! Thresholds and intervals are configured and reported in the format Go's
//! `time.Duration` uses (e.g., "30s", "5m", "1h30m"). Parsing accepts any sequence
//! of `<integer><unit>` segments with units `s`, `m` and `h`. Formatting produces
//! the canonical Go rendering, so a 5 minute threshold reads `5m0s` in messages.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;

/// Parse a Go-style duration string into a Rust `Duration`.
///
/// Supported units:
/// - `s` (seconds): "30s"
/// - `m` (minutes): "5m"
/// - `h` (hours): "1h"
///
/// Segments may be combined: "1h30m", "5m0s".
///
/// # Examples
///
/// ```
/// use gslb::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("10").is_err()); // Missing unit
/// assert!(parse_duration("10x").is_err()); // Invalid unit
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - The string is empty
/// - A segment is missing its unit or uses an unsupported unit
/// - The total overflows
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    if duration_str.is_empty() {
        bail!("Duration string cannot be empty");
    }

    let mut total: u64 = 0;
    let mut rest = duration_str;

    while !rest.is_empty() {
        let split_pos = rest
            .chars()
            .position(|c| !c.is_ascii_digit())
            .context("Duration must end with a unit (s, m, or h)")?;

        if split_pos == 0 {
            bail!("Duration '{duration_str}' has a unit without a value");
        }

        let (value_str, remainder) = rest.split_at(split_pos);
        let value: u64 = value_str
            .parse()
            .context("Duration value must be a positive integer")?;

        let unit_len = remainder
            .chars()
            .position(|c| c.is_ascii_digit())
            .unwrap_or(remainder.len());
        let (unit, next) = remainder.split_at(unit_len);

        let multiplier = match unit {
            "s" => 1,
            "m" => SECONDS_PER_MINUTE,
            "h" => SECONDS_PER_HOUR,
            _ => bail!(
                "Unsupported duration unit '{unit}'. Use 's' (seconds), 'm' (minutes), or 'h' (hours)"
            ),
        };

        let seconds = value
            .checked_mul(multiplier)
            .context("Duration value too large (overflow)")?;
        total = total
            .checked_add(seconds)
            .context("Duration value too large (overflow)")?;
        rest = next;
    }

    Ok(Duration::from_secs(total))
}

/// Format a `Duration` the way Go's `time.Duration.String()` does.
///
/// Sub-second precision is dropped for durations of one second or more.
///
/// ```
/// use gslb::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(300)), "5m0s");
/// assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
/// assert_eq!(format_duration(Duration::from_secs(30)), "30s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();

    if total == 0 {
        let millis = duration.subsec_millis();
        return if millis == 0 {
            "0s".to_string()
        } else {
            format!("{millis}ms")
        };
    }

    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod duration_tests;
