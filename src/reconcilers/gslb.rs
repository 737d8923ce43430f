// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Gslb` reconciliation logic.
//!
//! One cycle turns a `Gslb` declaration plus the state of this cluster and of
//! its peers into the routing `Ingress`, the `DNSEndpoint` record set and the
//! `Gslb` status:
//!
//! 1. validate the strategy against the fleet (nothing is written on failure)
//! 2. ensure the routing `Ingress` exists and read its load balancer addresses
//! 3. classify every hostname from its backing services
//! 4. guard and query every peer, concurrently and in isolation
//! 5. merge local and remote targets per the strategy
//! 6. replace the `DNSEndpoint`, then patch the status
//! 7. refresh this cluster's heartbeat at the edge
//!
//! Failures scoped to a hostname or a peer never abort the cycle: the affected
//! unit is left out and reported through the `Degraded` condition.

pub mod discovery;
pub mod health;
pub mod records;
pub mod remote;
pub mod split_brain;
pub mod strategy;
pub mod targets;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

use crate::context::Context;
use crate::crd::{Gslb, HealthStatus};
use crate::dns_errors::GslbError;
use crate::metrics;
use crate::reconcilers::status::{
    GslbStatusUpdater, CONDITION_TYPE_DEGRADED, CONDITION_TYPE_READY, STATUS_FALSE, STATUS_TRUE,
};
use anyhow::{Context as _, Result};
use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use tracing::{debug, error, info, warn};

use self::discovery::{discover_remotes, heartbeat_fqdn};
use self::health::classify_host;
use self::records::{build_dns_endpoint, build_endpoints, build_ingress};
use self::remote::collect_peers;
use self::strategy::{merge_targets, validate_strategy};
use self::targets::ingress_addresses;
use self::types::{HostPlan, PeerState, PeerView, PublicTargets, ReconcileSummary};

const REASON_RECONCILED: &str = "Reconciled";
const REASON_ALL_PEERS_LIVE: &str = "AllPeersLive";
const REASON_HEALTH_CHECK_FAILED: &str = "HealthCheckFailed";

/// A problem confined to one hostname or one peer.
struct Degradation {
    reason: &'static str,
    message: String,
}

/// Reconciles a `Gslb` resource.
///
/// # Arguments
///
/// * `ctx` - Cluster backend, edge DNS client and controller configuration
/// * `gslb` - The `Gslb` resource to reconcile
///
/// # Returns
///
/// A summary of what was published this cycle.
///
/// # Errors
///
/// Returns an error if:
/// - The failover strategy names no primary, or one outside the fleet
/// - The routing `Ingress` cannot be ensured
/// - The `DNSEndpoint` or the status cannot be written
///
/// Hostname-scoped and peer-scoped failures are not errors.
pub async fn reconcile_gslb(ctx: &Context, gslb: &Gslb) -> Result<ReconcileSummary> {
    let namespace = gslb.namespace().unwrap_or_default();
    let name = gslb.name_any();
    let config = &ctx.config;
    let now = Utc::now();

    info!("Reconciling Gslb: {}/{}", namespace, name);
    debug!(
        namespace = %namespace,
        name = %name,
        generation = ?gslb.metadata.generation,
        strategy = %gslb.spec.strategy.strategy_type,
        "Starting Gslb reconciliation"
    );

    if let Err(e) = validate_strategy(&gslb.spec.strategy, config) {
        error!("Rejecting Gslb {}/{}: {}", namespace, name, e);
        return Err(GslbError::from(e).into());
    }

    let hosts = gslb.spec.hosts();
    let mut degradations: Vec<Degradation> = Vec::new();

    if let Some(previous) = &gslb.status {
        metrics::forget_host_health(
            &namespace,
            &name,
            previous.managed_hosts.iter().filter(|h| !hosts.contains(h)),
        );
    }

    let ingress = ctx
        .backend
        .ensure_ingress(&build_ingress(gslb))
        .await
        .with_context(|| format!("Failed to ensure Ingress {namespace}/{name}"))?;

    // Health, per hostname
    let ns = namespace.as_str();
    let verdicts = join_all(hosts.iter().map(|host| async move {
        let services = gslb.spec.backend_services(host);
        let verdict = classify_host(ctx.backend.as_ref(), ns, &services).await;
        (host, verdict)
    }))
    .await;

    let mut service_health: BTreeMap<String, HealthStatus> = BTreeMap::new();
    for (host, verdict) in verdicts {
        match verdict {
            Ok(health) => {
                metrics::record_host_health(&namespace, &name, host, health);
                service_health.insert(host.clone(), health);
            }
            Err(e) => {
                warn!("Skipping {} this cycle, health check failed: {:#}", host, e);
                metrics::record_error("Gslb", REASON_HEALTH_CHECK_FAILED);
                degradations.push(Degradation {
                    reason: REASON_HEALTH_CHECK_FAILED,
                    message: format!("health check of {host} failed: {e}"),
                });
            }
        }
    }

    let local = ingress_addresses(&ingress, ctx.dns.as_ref()).await;
    if local.is_empty() {
        info!(
            "Ingress {}/{} reports no load balancer address yet",
            namespace, name
        );
    }

    let peers = contact_peers(ctx, &name, &hosts, now, &mut degradations).await;

    let plans: Vec<HostPlan> = hosts
        .iter()
        .filter_map(|host| {
            let health = *service_health.get(host)?;
            let mut plan = HostPlan {
                host: host.clone(),
                health,
                local: local.clone(),
                public: PublicTargets::Publish(Vec::new()),
            };
            if plan.is_serviceable() {
                plan.public = merge_targets(host, &local, &peers, &gslb.spec.strategy, config);
            }
            Some(plan)
        })
        .collect();

    for plan in &plans {
        if let PublicTargets::Withhold { reason } = &plan.public {
            degradations.push(Degradation {
                reason: "PrimaryStale",
                message: format!("{} withheld: {}", plan.host, reason),
            });
        }
    }

    let endpoints = build_endpoints(&plans, config.record_ttl);
    let published_records = endpoints.len();
    let dns_endpoint = build_dns_endpoint(gslb, endpoints, &config.cluster_geo_tag);

    ctx.backend
        .replace_dns_endpoint(&dns_endpoint)
        .await
        .with_context(|| format!("Failed to write DNSEndpoint {namespace}/{name}"))?;
    metrics::record_published_records(&namespace, &name, published_records);

    let healthy_records: BTreeMap<String, Vec<Ipv4Addr>> = plans
        .iter()
        .filter(|plan| plan.is_serviceable())
        .filter_map(|plan| plan.published().map(|t| (plan.host.clone(), t.to_vec())))
        .collect();

    let mut updater = GslbStatusUpdater::new(gslb);
    updater.set_managed_hosts(hosts.clone());
    updater.set_service_health(service_health);
    updater.set_healthy_records(healthy_records);
    updater.set_condition(
        CONDITION_TYPE_READY,
        STATUS_TRUE,
        REASON_RECONCILED,
        &format!(
            "{} host(s) managed, {} record(s) published",
            hosts.len(),
            published_records
        ),
    );
    match degradations.first() {
        Some(first) => {
            let message = degradations
                .iter()
                .map(|d| d.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            updater.set_condition(CONDITION_TYPE_DEGRADED, STATUS_TRUE, first.reason, &message);
        }
        None => updater.set_condition(
            CONDITION_TYPE_DEGRADED,
            STATUS_FALSE,
            REASON_ALL_PEERS_LIVE,
            "Every peer passed the split brain check",
        ),
    }
    if updater.conditions_changed() {
        debug!("Conditions of Gslb {}/{} changed", namespace, name);
    }

    ctx.backend
        .patch_gslb_status(gslb, &updater.finish())
        .await
        .with_context(|| format!("Failed to update status of Gslb {namespace}/{name}"))?;

    publish_heartbeat(ctx, &name).await;

    let summary = ReconcileSummary {
        managed_hosts: hosts.len(),
        published_records,
        live_peers: peers
            .iter()
            .filter(|p| p.is_live())
            .map(|p| p.cluster.geo_tag.clone())
            .collect(),
        excluded_peers: peers
            .iter()
            .filter(|p| !p.is_live())
            .map(|p| p.cluster.geo_tag.clone())
            .collect(),
        degraded: !degradations.is_empty(),
    };

    info!(
        "Reconciled Gslb {}/{}: {} host(s), {} record(s), live peers {:?}, excluded peers {:?}",
        namespace,
        name,
        summary.managed_hosts,
        summary.published_records,
        summary.live_peers,
        summary.excluded_peers
    );
    Ok(summary)
}

/// Guard and query every configured peer.
async fn contact_peers(
    ctx: &Context,
    gslb_name: &str,
    hosts: &[String],
    now: chrono::DateTime<Utc>,
    degradations: &mut Vec<Degradation>,
) -> Vec<PeerView> {
    let config = &ctx.config;
    let remotes = discover_remotes(gslb_name, config);
    if remotes.is_empty() {
        return Vec::new();
    }

    let delegation = match ctx.dns.delegation_list(&config.dns_zone).await {
        Ok(delegation) => delegation,
        Err(e) => {
            warn!(
                "Failed to read delegation of {}, peers contribute no targets: {}",
                config.dns_zone, e
            );
            let e = GslbError::from(e);
            degradations.push(Degradation {
                reason: e.status_reason(),
                message: e.to_string(),
            });
            Vec::new()
        }
    };

    let peers = collect_peers(
        ctx.dns.as_ref(),
        &remotes,
        &delegation,
        hosts,
        now,
        config.split_brain_threshold,
    )
    .await;

    for peer in &peers {
        metrics::record_remote_liveness(&peer.cluster.geo_tag, peer.is_live());
        match &peer.state {
            PeerState::Excluded(e) => {
                let geo_tag = &peer.cluster.geo_tag;
                let e = GslbError::from(e.clone());
                degradations.push(Degradation {
                    reason: e.status_reason(),
                    message: format!("peer {geo_tag} excluded: {e}"),
                });
            }
            PeerState::Live { failures, .. } => {
                for (host, e) in failures {
                    let geo_tag = &peer.cluster.geo_tag;
                    let e = GslbError::from(e.clone());
                    degradations.push(Degradation {
                        reason: e.status_reason(),
                        message: format!("{host} unresolved at peer {geo_tag}: {e}"),
                    });
                }
            }
        }
    }

    peers
}

/// Refresh this cluster's heartbeat. Failures are logged and counted only.
async fn publish_heartbeat(ctx: &Context, gslb_name: &str) {
    let config = &ctx.config;
    let Some(key) = &config.heartbeat_key else {
        return;
    };

    let fqdn = heartbeat_fqdn(gslb_name, &config.cluster_geo_tag, &config.edge_dns_zone);
    let value = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    match ctx
        .dns
        .publish_heartbeat(&fqdn, &config.edge_dns_zone, &value, key)
        .await
    {
        Ok(()) => {
            debug!("Published heartbeat {} = {}", fqdn, value);
            metrics::record_heartbeat_published(true);
        }
        Err(e) => {
            warn!("Failed to publish heartbeat {}: {}", fqdn, e);
            metrics::record_heartbeat_published(false);
        }
    }
}

#[cfg(test)]
#[path = "gslb_tests.rs"]
mod gslb_tests;
