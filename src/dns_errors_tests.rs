// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for GSLB error types.

#[cfg(test)]
mod tests {
    use crate::dns_errors::*;

    #[test]
    fn test_expired_heartbeat_message_names_threshold() {
        let error = SplitBrainError::Expired {
            fqdn: "test-gslb-heartbeat-eu.example.com".to_string(),
            threshold: "5m0s".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Split brain TXT record expired the time threshold: (5m0s)"
        );
        assert!(error.is_gone());
    }

    #[test]
    fn test_only_expired_is_gone() {
        let missing = SplitBrainError::Missing {
            fqdn: "test-gslb-heartbeat-za.example.com".to_string(),
        };
        let lookup = SplitBrainError::Lookup {
            fqdn: "test-gslb-heartbeat-za.example.com".to_string(),
            reason: "timed out".to_string(),
        };

        assert!(!missing.is_gone());
        assert!(!lookup.is_gone());
        assert_eq!(
            missing.to_string(),
            "Heartbeat TXT record 'test-gslb-heartbeat-za.example.com' not found"
        );
    }

    #[test]
    fn test_query_failed_message() {
        let error = EdgeDnsError::QueryFailed {
            name: "app3.cloud.example.com".to_string(),
            record_type: "A".to_string(),
            server: "10.1.0.1:53".to_string(),
            reason: "connection refused".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "DNS query for 'app3.cloud.example.com' (A) against 10.1.0.1:53 failed: connection refused"
        );
    }

    #[test]
    fn test_strategy_error_messages() {
        assert_eq!(
            StrategyError::MissingPrimaryGeoTag.to_string(),
            "Failover strategy requires primaryGeoTag to be set"
        );

        let unknown = StrategyError::UnknownPrimaryGeoTag {
            geo_tag: "us".to_string(),
            fleet: "eu, za".to_string(),
        };
        assert_eq!(
            unknown.to_string(),
            "Primary geo tag 'us' is not part of the configured fleet (eu, za)"
        );
    }

    #[test]
    fn test_transient_classification() {
        let stale: GslbError = SplitBrainError::Expired {
            fqdn: "x".to_string(),
            threshold: "5m0s".to_string(),
        }
        .into();
        assert!(stale.is_transient());

        let query: GslbError = EdgeDnsError::QueryFailed {
            name: "x".to_string(),
            record_type: "A".to_string(),
            server: "10.0.0.1:53".to_string(),
            reason: "timeout".to_string(),
        }
        .into();
        assert!(query.is_transient());

        let config: GslbError = StrategyError::MissingPrimaryGeoTag.into();
        assert!(!config.is_transient());

        let bad_name: GslbError = EdgeDnsError::InvalidName {
            name: "a..b".to_string(),
            reason: "empty label".to_string(),
        }
        .into();
        assert!(!bad_name.is_transient());

        let undelegated: GslbError = EdgeDnsError::NoNameservers {
            ns_fqdn: "test-gslb-ns-za.example.com".to_string(),
        }
        .into();
        assert!(undelegated.is_transient());
        assert_eq!(undelegated.status_reason(), "NoDelegatedNameservers");
    }

    #[test]
    fn test_status_reasons() {
        let stale: GslbError = SplitBrainError::Expired {
            fqdn: "x".to_string(),
            threshold: "5m0s".to_string(),
        }
        .into();
        assert_eq!(stale.status_reason(), "HeartbeatExpired");

        let primary: GslbError = StrategyError::PrimaryStale {
            geo_tag: "eu".to_string(),
            reason: "expired".to_string(),
        }
        .into();
        assert_eq!(primary.status_reason(), "PrimaryStale");

        let generic = GslbError::from(anyhow::anyhow!("boom"));
        assert_eq!(generic.status_reason(), "GslbOperationFailed");
        assert_eq!(generic.to_string(), "GSLB operation failed: boom");
    }
}
