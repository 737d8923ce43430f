// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the GSLB operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `Gslb` CRD
pub const API_GROUP: &str = "gslb.firestoned.io";

/// API version for the `Gslb` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "gslb.firestoned.io/v1alpha1";

/// Kind name for `Gslb` resource
pub const KIND_GSLB: &str = "Gslb";

/// API group of the external-dns `DNSEndpoint` CRD
pub const EXTERNAL_DNS_API_GROUP: &str = "externaldns.k8s.io";

/// Kind name for the external-dns `DNSEndpoint` resource
pub const KIND_DNS_ENDPOINT: &str = "DNSEndpoint";

/// Field manager name used for status patches
pub const FIELD_MANAGER: &str = "gslb-controller";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries and dynamic updates
pub const DNS_PORT: u16 = 53;

/// Default TTL for published GSLB records (30 seconds)
pub const DEFAULT_RECORD_TTL_SECS: i64 = 30;

/// Record type of every published GSLB record
pub const RECORD_TYPE_A: &str = "A";

/// Prefix of the strategy-independent record carrying only this cluster's targets
pub const LOCAL_TARGETS_PREFIX: &str = "localtargets";

/// Infix of the heartbeat TXT record FQDN (`<gslb>-heartbeat-<geo>.<zone>`)
pub const HEARTBEAT_INFIX: &str = "heartbeat";

/// Infix of the NS delegation FQDN (`<gslb>-ns-<geo>.<zone>`)
pub const NS_INFIX: &str = "ns";

/// TTL of the heartbeat TXT record this cluster publishes (30 seconds)
pub const HEARTBEAT_TTL_SECS: u32 = 30;

/// TSIG fudge time in seconds (allows for clock skew)
pub const TSIG_FUDGE_TIME_SECS: u64 = 300;

/// Timeout of a single DNS query or update over UDP
pub const DNS_QUERY_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Reconciliation Constants
// ============================================================================

/// Fixed delay before the next reconciliation of a `Gslb` (30 seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

/// Age after which a remote heartbeat is considered stale (5 minutes)
pub const DEFAULT_SPLIT_BRAIN_THRESHOLD_SECS: u64 = 300;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Name of the `Lease` used for leader election
pub const DEFAULT_LEASE_NAME: &str = "gslb-controller-leader";

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election grace period before expiry (5 seconds)
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
