// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for Go-style duration parsing and formatting

#[cfg(test)]
mod tests {
    use super::super::{format_duration, parse_duration};
    use std::time::Duration;

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_parse_duration_single_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn test_parse_duration_compound() {
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::from_secs(5400),
            "1h30m should be 5400 seconds"
        );
        assert_eq!(
            parse_duration("5m0s").unwrap(),
            Duration::from_secs(300),
            "Go rendering of 5 minutes must parse back"
        );
        assert_eq!(parse_duration("1h0m0s").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_duration_rejects_invalid() {
        assert!(parse_duration("").is_err(), "empty string");
        assert!(parse_duration("10").is_err(), "missing unit");
        assert!(parse_duration("10x").is_err(), "unknown unit");
        assert!(parse_duration("m").is_err(), "unit without value");
        assert!(parse_duration("-5m").is_err(), "negative value");
        assert!(parse_duration("5 m").is_err(), "embedded whitespace");
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("99999999999999999999h").is_err());
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
    }

    // ========================================================================
    // Formatting
    // ========================================================================

    #[test]
    fn test_format_duration_matches_go() {
        assert_eq!(format_duration(Duration::from_secs(300)), "5m0s");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h1m1s");
    }

    #[test]
    fn test_format_duration_sub_second() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_format_then_parse_threshold() {
        let threshold = Duration::from_secs(300);
        assert_eq!(parse_duration(&format_duration(threshold)).unwrap(), threshold);
    }
}
