// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Traffic strategies.
//!
//! # Round robin
//!
//! Every serviceable cluster publishes its own addresses followed by those of
//! each live peer, in discovery order.
//!
//! # Failover
//!
//! Traffic goes to the primary cluster only. The primary publishes its own
//! addresses; a secondary publishes whatever the primary serves. When the
//! primary is stale, or live but could not be asked about the hostname, a
//! secondary applies the configured fallback:
//!
//! - [`FailoverFallback::Propagate`]: withhold the hostname, leaving the edge
//!   with whatever the healthy clusters still publish
//! - [`FailoverFallback::LocalOnly`]: publish the local addresses

use super::types::{PeerState, PeerView, PublicTargets};
use crate::config::{FailoverFallback, GslbConfig};
use crate::crd::{Strategy, StrategyType};
use crate::dns_errors::StrategyError;
use std::net::Ipv4Addr;
use tracing::warn;

/// Check the declared strategy against the fleet before anything is written.
///
/// # Errors
///
/// Failover without a primary, or with a primary outside the fleet, is rejected.
pub fn validate_strategy(strategy: &Strategy, config: &GslbConfig) -> Result<(), StrategyError> {
    if strategy.strategy_type != StrategyType::Failover {
        return Ok(());
    }

    let primary = strategy
        .primary_geo_tag
        .as_deref()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .ok_or(StrategyError::MissingPrimaryGeoTag)?;

    if !config.is_fleet_member(primary) {
        return Err(StrategyError::UnknownPrimaryGeoTag {
            geo_tag: primary.to_string(),
            fleet: config.fleet().join(","),
        });
    }

    Ok(())
}

/// Round robin: local addresses, then every live peer's, in discovery order.
///
/// An address published by several clusters is listed once per cluster.
#[must_use]
pub fn round_robin(host: &str, local: &[Ipv4Addr], peers: &[PeerView]) -> Vec<Ipv4Addr> {
    let remote = peers.iter().filter_map(|p| p.targets_for(host)).flatten();
    local.iter().chain(remote).copied().collect()
}

/// Failover decision for one hostname.
///
/// `primary` must already have passed [`validate_strategy`].
#[must_use]
pub fn failover(
    host: &str,
    local: &[Ipv4Addr],
    peers: &[PeerView],
    primary: &str,
    own_geo_tag: &str,
    fallback: FailoverFallback,
) -> PublicTargets {
    if primary == own_geo_tag {
        return PublicTargets::Publish(local.to_vec());
    }

    let stale_reason = match peers.iter().find(|p| p.cluster.geo_tag == primary) {
        Some(PeerView {
            state: PeerState::Live { targets, failures },
            ..
        }) => match targets.get(host) {
            Some(primary_targets) => return PublicTargets::Publish(primary_targets.clone()),
            None => failures
                .iter()
                .find(|(failed, _)| failed == host)
                .map_or_else(
                    || format!("{host} was not resolved"),
                    |(_, e)| format!("{host} unresolved: {e}"),
                ),
        },
        Some(PeerView {
            state: PeerState::Excluded(e),
            ..
        }) => e.to_string(),
        None => format!("primary '{primary}' was not discovered"),
    };

    let stale = StrategyError::PrimaryStale {
        geo_tag: primary.to_string(),
        reason: stale_reason,
    };
    match fallback {
        FailoverFallback::Propagate => {
            warn!("Withholding {}: {}", host, stale);
            PublicTargets::Withhold {
                reason: stale.to_string(),
            }
        }
        FailoverFallback::LocalOnly => {
            warn!("Publishing local targets for {}: {}", host, stale);
            PublicTargets::Publish(local.to_vec())
        }
    }
}

/// Public targets of a serviceable hostname under `strategy`.
#[must_use]
pub fn merge_targets(
    host: &str,
    local: &[Ipv4Addr],
    peers: &[PeerView],
    strategy: &Strategy,
    config: &GslbConfig,
) -> PublicTargets {
    match (strategy.strategy_type, strategy.primary_geo_tag.as_deref()) {
        (StrategyType::Failover, Some(primary)) => failover(
            host,
            local,
            peers,
            primary.trim(),
            &config.cluster_geo_tag,
            config.failover_fallback,
        ),
        _ => PublicTargets::Publish(round_robin(host, local, peers)),
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod strategy_tests;
