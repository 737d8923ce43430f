// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Remote target resolution.
//!
//! Peers are found through the delegation of the GSLB zone at the edge: each
//! peer's nameserver is listed under its `<gslb>-ns-<geo>` name. Once a peer has
//! passed the split-brain guard, its nameservers are asked for the A records of
//! every managed hostname.

use super::split_brain::guard;
use super::types::{PeerState, PeerView, RemoteCluster};
use crate::dns_errors::EdgeDnsError;
use crate::edge_dns::{EdgeDns, NameServer};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Keep the delegation entries served under `ns_fqdn`, preserving order.
///
/// Names compare case-insensitively and without the trailing root dot.
#[must_use]
pub fn filter_delegate_to(delegation: &[NameServer], ns_fqdn: &str) -> Vec<NameServer> {
    let wanted = ns_fqdn.trim_end_matches('.');
    delegation
        .iter()
        .filter(|ns| ns.name.trim_end_matches('.').eq_ignore_ascii_case(wanted))
        .cloned()
        .collect()
}

/// Ask the peer's nameservers for every hostname.
///
/// A hostname whose lookup fails is left out of the targets and reported in the
/// failures; the other hostnames are unaffected. Without any nameserver every
/// hostname is reported as unresolved.
pub async fn resolve_remote_targets(
    dns: &dyn EdgeDns,
    remote: &RemoteCluster,
    nameservers: &[NameServer],
    hosts: &[String],
) -> PeerState {
    let servers: Vec<IpAddr> = nameservers.iter().map(|ns| ns.address).collect();
    if servers.is_empty() {
        warn!(
            "No delegation entry for {} (peer {}); it contributes no targets",
            remote.ns_fqdn, remote.geo_tag
        );
        let missing = EdgeDnsError::NoNameservers {
            ns_fqdn: remote.ns_fqdn.clone(),
        };
        return PeerState::Live {
            targets: BTreeMap::new(),
            failures: hosts.iter().map(|h| (h.clone(), missing.clone())).collect(),
        };
    }

    let mut targets = BTreeMap::new();
    let mut failures = Vec::new();
    for host in hosts {
        match dns.resolve_a(host, &servers).await {
            Ok(addresses) => {
                debug!(
                    "Peer {} serves {} on {:?}",
                    remote.geo_tag, host, addresses
                );
                targets.insert(host.clone(), addresses);
            }
            Err(e) => {
                warn!(
                    "Failed to resolve {} at peer {}: {}",
                    host, remote.geo_tag, e
                );
                failures.push((host.clone(), e));
            }
        }
    }

    PeerState::Live { targets, failures }
}

/// Contact every peer concurrently: guard, then resolve.
///
/// Each peer is handled in isolation; results come back in discovery order.
pub async fn collect_peers(
    dns: &dyn EdgeDns,
    remotes: &[RemoteCluster],
    delegation: &[NameServer],
    hosts: &[String],
    now: DateTime<Utc>,
    threshold: Duration,
) -> Vec<PeerView> {
    let lookups = remotes.iter().map(|remote| async move {
        let state = match guard(dns, remote, now, threshold).await {
            Ok(_) => {
                let nameservers = filter_delegate_to(delegation, &remote.ns_fqdn);
                resolve_remote_targets(dns, remote, &nameservers, hosts).await
            }
            Err(e) if e.is_gone() => {
                warn!("Excluding stale peer {}: {}", remote.geo_tag, e);
                PeerState::Excluded(e)
            }
            Err(e) => {
                warn!("Excluding unreachable peer {}: {}", remote.geo_tag, e);
                PeerState::Excluded(e)
            }
        };
        PeerView {
            cluster: remote.clone(),
            state,
        }
    });

    join_all(lookups).await
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod remote_tests;
