// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Types shared by the `Gslb` reconciliation steps.

use crate::crd::HealthStatus;
use crate::dns_errors::{EdgeDnsError, SplitBrainError};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// A peer cluster of the fleet, identified by its geo-tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteCluster {
    pub geo_tag: String,
    /// FQDN of the TXT record the peer refreshes
    pub heartbeat_fqdn: String,
    /// Nameserver name the peer is delegated under in the GSLB zone
    pub ns_fqdn: String,
}

/// Outcome of contacting one peer during a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerState {
    /// The peer passed the split-brain guard. Hostnames whose lookup failed are
    /// absent from `targets` and listed in `failures`.
    Live {
        targets: BTreeMap<String, Vec<Ipv4Addr>>,
        failures: Vec<(String, EdgeDnsError)>,
    },

    /// The peer failed the split-brain guard and contributes nothing.
    Excluded(SplitBrainError),
}

/// A peer and what it contributed this cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerView {
    pub cluster: RemoteCluster,
    pub state: PeerState,
}

impl PeerView {
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self.state, PeerState::Live { .. })
    }

    /// Targets this peer serves for `host`, if it is live and answered.
    #[must_use]
    pub fn targets_for(&self, host: &str) -> Option<&[Ipv4Addr]> {
        match &self.state {
            PeerState::Live { targets, .. } => targets.get(host).map(Vec::as_slice),
            PeerState::Excluded(_) => None,
        }
    }
}

/// Public address decision for one hostname.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicTargets {
    /// Publish these addresses (may be empty, in which case nothing is emitted)
    Publish(Vec<Ipv4Addr>),

    /// Withhold the hostname entirely this cycle
    Withhold { reason: String },
}

/// Everything the record builder needs to know about one hostname.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostPlan {
    pub host: String,
    pub health: HealthStatus,
    /// Addresses this cluster serves the hostname on
    pub local: Vec<Ipv4Addr>,
    pub public: PublicTargets,
}

impl HostPlan {
    /// Whether this cluster can serve the hostname: healthy with at least one
    /// local address.
    #[must_use]
    pub fn is_serviceable(&self) -> bool {
        self.health == HealthStatus::Healthy && !self.local.is_empty()
    }

    #[must_use]
    pub fn is_withheld(&self) -> bool {
        matches!(self.public, PublicTargets::Withhold { .. })
    }

    /// The public addresses that will actually be emitted.
    #[must_use]
    pub fn published(&self) -> Option<&[Ipv4Addr]> {
        match &self.public {
            PublicTargets::Publish(targets) if !targets.is_empty() => Some(targets),
            _ => None,
        }
    }
}

/// Summary of one reconciliation cycle, logged by the controller loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub managed_hosts: usize,
    pub published_records: usize,
    pub live_peers: Vec<String>,
    pub excluded_peers: Vec<String>,
    pub degraded: bool,
}
