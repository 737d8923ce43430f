// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the GSLB controller.
//!
//! All metrics carry the namespace prefix `gslb_firestoned_io_` (prometheus-safe
//! version of "gslb.firestoned.io").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconciliation outcomes and durations
//! - **GSLB State Metrics** - Host health, peer liveness and published records
//! - **Resource Lifecycle Metrics** - Objects created or replaced by the controller
//! - **Leader Election Metrics** - Leadership state changes
//!
//! # Example
//!
//! ```rust,no_run
//! use gslb::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Gslb", std::time::Duration::from_secs(1));
//! ```

use crate::crd::HealthStatus;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all GSLB metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "gslb_firestoned_io";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (`Gslb`)
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of errors by resource type and error category
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `error_type`: Status reason of the error (e.g., `HeartbeatExpired`, `DnsQueryFailed`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error category",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// GSLB State Metrics
// ============================================================================

/// Health of each managed hostname
///
/// Labels:
/// - `namespace`, `gslb`: The owning `Gslb`
/// - `host`: Managed hostname
///
/// Value: 0 = `NotFound`, 1 = `Unhealthy`, 2 = `Healthy`
pub static HOST_HEALTH: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_host_health"),
        "Health of managed hostnames (0 = NotFound, 1 = Unhealthy, 2 = Healthy)",
    );
    let gauge = GaugeVec::new(opts, &["namespace", "gslb", "host"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Liveness of each peer cluster as seen by the split-brain guard
///
/// Labels:
/// - `geo_tag`: Peer cluster geo-tag
///
/// Value: 1 if the heartbeat is fresh, 0 otherwise
pub static REMOTE_CLUSTER_LIVE: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_remote_cluster_live"),
        "Liveness of peer clusters (1 = live, 0 = stale or unreachable)",
    );
    let gauge = GaugeVec::new(opts, &["geo_tag"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Number of records in the desired record set of a `Gslb`
pub static PUBLISHED_RECORDS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_published_records"),
        "Number of DNS records in the desired record set by Gslb",
    );
    let gauge = GaugeVec::new(opts, &["namespace", "gslb"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Heartbeat publications by outcome (`success`, `error`)
pub static HEARTBEAT_PUBLISH_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_heartbeat_publish_total"),
        "Total number of heartbeat TXT publications by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Resource Lifecycle Metrics
// ============================================================================

/// Total number of resources created
pub static RESOURCES_CREATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_created_total"),
        "Total number of resources created by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of resources updated
pub static RESOURCES_UPDATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_updated_total"),
        "Total number of resources updated by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Leader Election Metrics
// ============================================================================

/// Total number of leader election events
///
/// Labels:
/// - `status`: Event type (`acquired`, `lost`)
pub static LEADER_ELECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_elections_total"),
        "Total number of leader election events by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Current leader election status (1 if leader, 0 if follower)
pub static LEADER_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_status"),
        "Current leader election status (1 = leader, 0 = follower)",
    );
    let gauge = GaugeVec::new(opts, &["pod_name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where error occurred
/// * `error_type` - Category of error (a status reason)
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Record the health verdict of a managed hostname
pub fn record_host_health(namespace: &str, gslb: &str, host: &str, health: HealthStatus) {
    let value = match health {
        HealthStatus::NotFound => 0.0,
        HealthStatus::Unhealthy => 1.0,
        HealthStatus::Healthy => 2.0,
    };
    HOST_HEALTH
        .with_label_values(&[namespace, gslb, host])
        .set(value);
}

/// Drop the health series of hostnames a `Gslb` no longer manages
pub fn forget_host_health<'a>(
    namespace: &str,
    gslb: &str,
    hosts: impl IntoIterator<Item = &'a String>,
) {
    for host in hosts {
        // Absent series are fine: the host may never have been classified.
        let _ = HOST_HEALTH.remove_label_values(&[namespace, gslb, host]);
    }
}

/// Record whether a peer cluster passed the split-brain guard
pub fn record_remote_liveness(geo_tag: &str, live: bool) {
    REMOTE_CLUSTER_LIVE
        .with_label_values(&[geo_tag])
        .set(if live { 1.0 } else { 0.0 });
}

/// Record the size of the desired record set of a `Gslb`
pub fn record_published_records(namespace: &str, gslb: &str, count: usize) {
    #[allow(clippy::cast_precision_loss)]
    PUBLISHED_RECORDS
        .with_label_values(&[namespace, gslb])
        .set(count as f64);
}

/// Record the outcome of a heartbeat publication
pub fn record_heartbeat_published(success: bool) {
    HEARTBEAT_PUBLISH_TOTAL
        .with_label_values(&[if success { "success" } else { "error" }])
        .inc();
}

/// Record resource creation
pub fn record_resource_created(resource_type: &str) {
    RESOURCES_CREATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource update
pub fn record_resource_updated(resource_type: &str) {
    RESOURCES_UPDATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record leader election acquired
pub fn record_leader_elected(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL
        .with_label_values(&["acquired"])
        .inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(1.0);
}

/// Record leader election lost
pub fn record_leader_lost(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["lost"]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(0.0);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
