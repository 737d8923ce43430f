// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::reconcilers::gslb::discovery::discover_remotes;
    use crate::reconcilers::gslb::test_support::{config, FakeDns, GSLB_NAME};
    use chrono::TimeZone;

    const FQDN: &str = "test-gslb-heartbeat-za.example.com";
    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn txt(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_heartbeat_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 11, 58, 0).unwrap();

        assert_eq!(parse_heartbeat("2025-06-01T11:58:00Z"), Some(expected));
        assert_eq!(parse_heartbeat("2025-06-01T13:58:00+02:00"), Some(expected));
        assert_eq!(parse_heartbeat("2025-06-01T11:58:00"), Some(expected));
        assert_eq!(parse_heartbeat("\"2025-06-01T11:58:00Z\""), Some(expected));
        assert_eq!(parse_heartbeat("yesterday"), None);
    }

    #[test]
    fn test_fresh_heartbeat_passes() {
        let ts = check_heartbeat(FQDN, &txt(&["2025-06-01T11:58:00Z"]), now(), FIVE_MINUTES)
            .unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 11, 58, 0).unwrap());
    }

    #[test]
    fn test_heartbeat_exactly_at_threshold_passes() {
        assert!(
            check_heartbeat(FQDN, &txt(&["2025-06-01T11:55:00Z"]), now(), FIVE_MINUTES).is_ok()
        );
    }

    #[test]
    fn test_expired_heartbeat_reports_threshold() {
        let err = check_heartbeat(FQDN, &txt(&["2025-06-01T11:50:00Z"]), now(), FIVE_MINUTES)
            .unwrap_err();

        assert!(err.is_gone());
        assert_eq!(
            err.to_string(),
            "Split brain TXT record expired the time threshold: (5m0s)"
        );
    }

    #[test]
    fn test_future_heartbeat_is_fresh() {
        assert!(
            check_heartbeat(FQDN, &txt(&["2025-06-01T12:03:00Z"]), now(), FIVE_MINUTES).is_ok()
        );
    }

    #[test]
    fn test_newest_value_wins() {
        let values = txt(&["2025-06-01T10:00:00Z", "garbage", "2025-06-01T11:59:00Z"]);
        assert!(check_heartbeat(FQDN, &values, now(), FIVE_MINUTES).is_ok());
    }

    #[test]
    fn test_missing_and_malformed() {
        assert_eq!(
            check_heartbeat(FQDN, &[], now(), FIVE_MINUTES).unwrap_err(),
            SplitBrainError::Missing {
                fqdn: FQDN.to_string()
            }
        );
        assert_eq!(
            check_heartbeat(FQDN, &txt(&["not-a-time"]), now(), FIVE_MINUTES).unwrap_err(),
            SplitBrainError::Malformed {
                fqdn: FQDN.to_string(),
                value: "not-a-time".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_guard_reads_peer_heartbeat() {
        let dns = FakeDns::default();
        dns.set_heartbeat(FQDN, "2025-06-01T11:59:30Z");
        let remote = discover_remotes(GSLB_NAME, &config("eu", &["za"])).remove(0);

        assert!(guard(&dns, &remote, now(), FIVE_MINUTES).await.is_ok());
    }

    #[tokio::test]
    async fn test_guard_lookup_failure() {
        let dns = FakeDns::default();
        dns.failing_txt.lock().unwrap().insert(FQDN.to_string());
        let remote = discover_remotes(GSLB_NAME, &config("eu", &["za"])).remove(0);

        let err = guard(&dns, &remote, now(), FIVE_MINUTES).await.unwrap_err();
        assert!(matches!(err, SplitBrainError::Lookup { .. }));
        assert!(!err.is_gone());
    }
}
