// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Local target extraction from the managed `Ingress` status.

use crate::edge_dns::EdgeDns;
use k8s_openapi::api::networking::v1::Ingress;
use std::net::Ipv4Addr;
use tracing::warn;

/// Addresses the ingress controller reports in `status.loadBalancer.ingress`.
///
/// IP entries are taken as-is; hostname entries (cloud load balancers) are
/// resolved. An entry that cannot be resolved is skipped. Addresses are
/// returned in status order, exactly as reported.
pub async fn ingress_addresses(ingress: &Ingress, dns: &dyn EdgeDns) -> Vec<Ipv4Addr> {
    let entries = ingress
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref());

    let mut addresses = Vec::new();
    for entry in entries.into_iter().flatten() {
        let resolved = if let Some(ip) = &entry.ip {
            match ip.parse::<Ipv4Addr>() {
                Ok(addr) => vec![addr],
                Err(_) => {
                    warn!("Ignoring non-IPv4 load balancer address {}", ip);
                    Vec::new()
                }
            }
        } else if let Some(hostname) = &entry.hostname {
            match dns.lookup_host(hostname).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    warn!("Failed to resolve load balancer hostname {}: {}", hostname, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        addresses.extend(resolved);
    }

    addresses
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod targets_tests;
