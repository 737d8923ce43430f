// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `Gslb` resources.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (`Ready`, `Degraded`)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed

use crate::crd::{Condition, Gslb, GslbStatus, HealthStatus};
use chrono::Utc;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

pub const CONDITION_TYPE_READY: &str = "Ready";
pub const CONDITION_TYPE_DEGRADED: &str = "Degraded";
pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Example
///
/// ```rust
/// # use gslb::reconcilers::status::create_condition;
/// let condition = create_condition("Ready", "True", "Reconciled", "3 hosts managed");
/// assert_eq!(condition.r#type, "Ready");
/// assert_eq!(condition.status, "True");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// The `lastTransitionTime` is preserved while the status value stays the same.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists, ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|new_cond| {
            find_condition(current, &new_cond.r#type).is_some_and(|curr| {
                curr.status == new_cond.status
                    && curr.reason == new_cond.reason
                    && curr.message == new_cond.message
            })
        })
}

/// Collects the status of one reconciliation in memory.
///
/// The status is rebuilt from scratch each cycle; only the conditions of the
/// previous status are consulted, to keep their transition times stable.
/// Nothing is written to the API server until the caller persists
/// [`GslbStatusUpdater::finish`].
pub struct GslbStatusUpdater {
    previous_conditions: Vec<Condition>,
    new_status: GslbStatus,
}

impl GslbStatusUpdater {
    #[must_use]
    pub fn new(gslb: &Gslb) -> Self {
        let previous_conditions = gslb
            .status
            .as_ref()
            .map(|s| s.conditions.clone())
            .unwrap_or_default();

        Self {
            new_status: GslbStatus {
                conditions: previous_conditions.clone(),
                observed_generation: gslb.metadata.generation,
                ..Default::default()
            },
            previous_conditions,
        }
    }

    pub fn set_managed_hosts(&mut self, hosts: Vec<String>) {
        self.new_status.managed_hosts = hosts;
    }

    pub fn set_service_health(&mut self, health: BTreeMap<String, HealthStatus>) {
        self.new_status.service_health = health;
    }

    pub fn set_healthy_records(&mut self, records: BTreeMap<String, Vec<Ipv4Addr>>) {
        self.new_status.healthy_records = records;
    }

    /// Update or add a condition (in-memory only, no API call).
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: &str,
        message: &str,
    ) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    /// Whether the conditions differ from the ones the resource had before this cycle.
    #[must_use]
    pub fn conditions_changed(&self) -> bool {
        !conditions_equal(&self.previous_conditions, &self.new_status.conditions)
    }

    #[must_use]
    pub fn finish(self) -> GslbStatus {
        self.new_status
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
