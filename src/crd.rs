// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for multi-cluster GSLB.
//!
//! # Resource Types
//!
//! - [`Gslb`] - Declares hostnames (as ingress rules) that must resolve to healthy
//!   backends across the fleet, and the traffic strategy used to merge them
//! - [`DNSEndpoint`] - The external-dns record set this controller writes for the
//!   downstream DNS publisher. The definition mirrors `externaldns.k8s.io/v1alpha1`
//!   and is not installed by this project.
//!
//! # Example: Declaring a Gslb
//!
//! ```rust,no_run
//! use gslb::crd::{GslbSpec, Strategy, StrategyType};
//! use k8s_openapi::api::networking::v1::{IngressRule, IngressSpec};
//!
//! let spec = GslbSpec {
//!     ingress: IngressSpec {
//!         rules: Some(vec![IngressRule {
//!             host: Some("app.cloud.example.com".to_string()),
//!             ..Default::default()
//!         }]),
//!         ..Default::default()
//!     },
//!     strategy: Strategy {
//!         strategy_type: StrategyType::Failover,
//!         primary_geo_tag: Some("eu".to_string()),
//!     },
//! };
//! ```

use k8s_openapi::api::networking::v1::IngressSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition: Ready or Degraded.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Traffic strategy type.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StrategyType {
    /// Publish local targets followed by the targets of every live peer
    #[default]
    RoundRobin,
    /// Publish only the primary cluster's targets
    Failover,
}

impl std::fmt::Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "roundRobin"),
            Self::Failover => write!(f, "failover"),
        }
    }
}

/// Traffic strategy used to merge local and remote targets.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    /// Strategy type: `roundRobin` (default) or `failover`.
    #[serde(rename = "type", default)]
    pub strategy_type: StrategyType,

    /// Geo-tag of the primary cluster. Required when type is `failover`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_geo_tag: Option<String>,
}

/// Health verdict of a managed hostname.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// No backing service exists
    NotFound,
    /// The service exists but has no ready address
    Unhealthy,
    /// At least one ready address backs the hostname
    Healthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "NotFound"),
            Self::Unhealthy => write!(f, "Unhealthy"),
            Self::Healthy => write!(f, "Healthy"),
        }
    }
}

/// `Gslb` status. Recomputed in full on every reconciliation.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GslbStatus {
    /// Declared hostnames, in declaration order
    #[serde(default)]
    pub managed_hosts: Vec<String>,

    /// Health verdict per hostname
    #[serde(default)]
    pub service_health: BTreeMap<String, HealthStatus>,

    /// Addresses published for each hostname's public record
    #[serde(default)]
    pub healthy_records: BTreeMap<String, Vec<Ipv4Addr>>,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// `Gslb` declares a set of hostnames load balanced across geographically distinct clusters.
///
/// Hostnames are the hosts of the ingress rules, in declaration order. The backend
/// services of each rule decide the hostname's health.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gslb.firestoned.io",
    version = "v1alpha1",
    kind = "Gslb",
    namespaced,
    shortname = "gslb",
    doc = "Gslb declares hostnames that resolve, via DNS, to healthy backends in this cluster and, depending on the traffic strategy, in peer clusters.",
    printcolumn = r#"{"name":"Strategy","type":"string","jsonPath":".spec.strategy.type"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#
)]
#[kube(status = "GslbStatus")]
#[serde(rename_all = "camelCase")]
pub struct GslbSpec {
    /// Ingress created for the Gslb. Rule hosts are the managed hostnames.
    pub ingress: IngressSpec,

    /// Traffic strategy. Defaults to round robin.
    #[serde(default)]
    pub strategy: Strategy,
}

impl GslbSpec {
    /// Declared hostnames in declaration order. A host repeated across rules is listed once.
    #[must_use]
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for host in self
            .ingress
            .rules
            .iter()
            .flatten()
            .filter_map(|rule| rule.host.as_deref())
        {
            if !hosts.iter().any(|h| h == host) {
                hosts.push(host.to_string());
            }
        }
        hosts
    }

    /// Names of the services backing `host`, across every rule and path declaring it.
    #[must_use]
    pub fn backend_services(&self, host: &str) -> Vec<String> {
        let mut services: Vec<String> = Vec::new();
        let names = self
            .ingress
            .rules
            .iter()
            .flatten()
            .filter(|rule| rule.host.as_deref() == Some(host))
            .filter_map(|rule| rule.http.as_ref())
            .flat_map(|http| http.paths.iter())
            .filter_map(|path| path.backend.service.as_ref())
            .map(|service| service.name.as_str());
        for name in names {
            if !services.iter().any(|s| s == name) {
                services.push(name.to_string());
            }
        }
        services
    }
}

/// One DNS record in a [`DNSEndpoint`].
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified record name
    pub dns_name: String,

    /// Record targets
    #[serde(default)]
    pub targets: Vec<String>,

    /// Record type (e.g., "A")
    pub record_type: String,

    /// TTL in seconds
    #[serde(rename = "recordTTL", skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<i64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSEndpointStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// external-dns record set consumed by the downstream DNS publisher.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "externaldns.k8s.io",
    version = "v1alpha1",
    kind = "DNSEndpoint",
    namespaced
)]
#[kube(status = "DNSEndpointStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSEndpointSpec {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
