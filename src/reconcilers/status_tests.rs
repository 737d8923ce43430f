// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{Condition, Gslb, GslbSpec, GslbStatus, HealthStatus, Strategy};
    use crate::reconcilers::status::{
        conditions_equal, create_condition, find_condition, update_condition_in_memory,
        GslbStatusUpdater, CONDITION_TYPE_DEGRADED, CONDITION_TYPE_READY, STATUS_FALSE,
        STATUS_TRUE,
    };
    use k8s_openapi::api::networking::v1::IngressSpec;
    use std::collections::BTreeMap;

    fn gslb_with_status(status: Option<GslbStatus>) -> Gslb {
        let mut gslb = Gslb::new(
            "test-gslb",
            GslbSpec {
                ingress: IngressSpec::default(),
                strategy: Strategy::default(),
            },
        );
        gslb.metadata.namespace = Some("test-gslb".to_string());
        gslb.metadata.generation = Some(4);
        gslb.status = status;
        gslb
    }

    #[test]
    fn test_create_condition_basic() {
        let condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Reconciled", "ok");

        assert_eq!(condition.r#type, CONDITION_TYPE_READY);
        assert_eq!(condition.status, STATUS_TRUE);
        assert_eq!(condition.reason, Some("Reconciled".to_string()));
        assert_eq!(condition.message, Some("ok".to_string()));

        let timestamp = condition.last_transition_time.as_ref().unwrap();
        assert!(timestamp.contains('T'));
    }

    #[test]
    fn test_update_condition_preserves_transition_time_when_status_unchanged() {
        let mut conditions = vec![Condition {
            r#type: CONDITION_TYPE_READY.to_string(),
            status: STATUS_TRUE.to_string(),
            reason: Some("Reconciled".to_string()),
            message: Some("2 hosts".to_string()),
            last_transition_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        }];

        update_condition_in_memory(
            &mut conditions,
            CONDITION_TYPE_READY,
            STATUS_TRUE,
            "Reconciled",
            "3 hosts",
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].message.as_deref(), Some("3 hosts"));
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_update_condition_resets_transition_time_on_status_change() {
        let mut conditions = vec![Condition {
            r#type: CONDITION_TYPE_DEGRADED.to_string(),
            status: STATUS_FALSE.to_string(),
            reason: Some("AllPeersLive".to_string()),
            message: None,
            last_transition_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        }];

        update_condition_in_memory(
            &mut conditions,
            CONDITION_TYPE_DEGRADED,
            STATUS_TRUE,
            "PeersStale",
            "za",
        );

        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_conditions_equal_ignores_timestamps() {
        let a = vec![create_condition("Ready", "True", "Reconciled", "ok")];
        let mut b = a.clone();
        b[0].last_transition_time = Some("1970-01-01T00:00:00+00:00".to_string());
        assert!(conditions_equal(&a, &b));

        b[0].status = "False".to_string();
        assert!(!conditions_equal(&a, &b));
        assert!(!conditions_equal(&a, &[]));
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![
            create_condition("Ready", "True", "Reconciled", "ok"),
            create_condition("Degraded", "False", "AllPeersLive", "ok"),
        ];
        assert_eq!(
            find_condition(&conditions, "Degraded").map(|c| c.status.as_str()),
            Some("False")
        );
        assert!(find_condition(&conditions, "Progressing").is_none());
    }

    #[test]
    fn test_updater_replaces_previous_status_wholesale() {
        let mut old_health = BTreeMap::new();
        old_health.insert("gone.cloud.example.com".to_string(), HealthStatus::Healthy);
        let gslb = gslb_with_status(Some(GslbStatus {
            managed_hosts: vec!["gone.cloud.example.com".to_string()],
            service_health: old_health,
            conditions: vec![create_condition("Ready", "True", "Reconciled", "1 host")],
            ..Default::default()
        }));

        let mut updater = GslbStatusUpdater::new(&gslb);
        let mut health = BTreeMap::new();
        health.insert("app3.cloud.example.com".to_string(), HealthStatus::Healthy);
        updater.set_managed_hosts(vec!["app3.cloud.example.com".to_string()]);
        updater.set_service_health(health);
        updater.set_condition("Ready", "True", "Reconciled", "1 host");
        assert!(!updater.conditions_changed());

        let status = updater.finish();
        assert_eq!(status.managed_hosts, vec!["app3.cloud.example.com"]);
        assert!(!status.service_health.contains_key("gone.cloud.example.com"));
        assert!(status.healthy_records.is_empty());
        assert_eq!(status.observed_generation, Some(4));
    }

    #[test]
    fn test_updater_reports_condition_changes() {
        let gslb = gslb_with_status(None);
        let mut updater = GslbStatusUpdater::new(&gslb);
        updater.set_condition("Degraded", "True", "PeersStale", "za");
        assert!(updater.conditions_changed());
    }
}
