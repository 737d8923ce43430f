// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Peer discovery and DNS naming conventions.
//!
//! Every cluster of the fleet publishes, in the edge zone:
//! - `<gslb>-heartbeat-<geo>.<edge zone>` - TXT heartbeat
//! - `<gslb>-ns-<geo>.<edge zone>` - nameserver name delegated the GSLB zone

use super::types::RemoteCluster;
use crate::config::GslbConfig;
use crate::constants::{HEARTBEAT_INFIX, NS_INFIX};

/// Heartbeat FQDN of `geo_tag` for the `Gslb` named `gslb_name`.
#[must_use]
pub fn heartbeat_fqdn(gslb_name: &str, geo_tag: &str, edge_zone: &str) -> String {
    format!("{gslb_name}-{HEARTBEAT_INFIX}-{geo_tag}.{edge_zone}")
}

/// Delegated nameserver name of `geo_tag` for the `Gslb` named `gslb_name`.
#[must_use]
pub fn ns_fqdn(gslb_name: &str, geo_tag: &str, edge_zone: &str) -> String {
    format!("{gslb_name}-{NS_INFIX}-{geo_tag}.{edge_zone}")
}

/// Peers of this cluster in configuration order.
///
/// The own geo-tag is never a peer and repeated tags are listed once.
#[must_use]
pub fn discover_remotes(gslb_name: &str, config: &GslbConfig) -> Vec<RemoteCluster> {
    let mut remotes: Vec<RemoteCluster> = Vec::new();

    for geo_tag in &config.ext_geo_tags {
        if *geo_tag == config.cluster_geo_tag || remotes.iter().any(|r| &r.geo_tag == geo_tag) {
            continue;
        }
        remotes.push(RemoteCluster {
            geo_tag: geo_tag.clone(),
            heartbeat_fqdn: heartbeat_fqdn(gslb_name, geo_tag, &config.edge_dns_zone),
            ns_fqdn: ns_fqdn(gslb_name, geo_tag, &config.edge_dns_zone),
        });
    }

    remotes
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod discovery_tests;
