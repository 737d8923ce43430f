// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the GSLB reconciliation engine.
//!
//! This module provides specialized error types for:
//! - Split-brain detection (heartbeat TXT records of remote clusters)
//! - Edge DNS operations (queries, delegation lookups, dynamic updates)
//! - Traffic strategy evaluation (failover primary resolution)
//!
//! The taxonomy decides how a failure is handled by the reconciler: stale remotes
//! are excluded from a cycle, per-host or per-remote lookup failures are isolated,
//! and configuration inconsistencies abort the cycle before anything is written.

use thiserror::Error;

/// Errors produced by the split-brain guard when validating a remote heartbeat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitBrainError {
    /// The heartbeat timestamp is older than the staleness threshold.
    ///
    /// This is the "Gone" condition: the remote cluster may still answer DNS
    /// queries, but what it publishes can no longer be trusted.
    #[error("Split brain TXT record expired the time threshold: ({threshold})")]
    Expired {
        /// Heartbeat FQDN that was checked
        fqdn: String,
        /// Threshold rendered as a Go duration (e.g., "5m0s")
        threshold: String,
    },

    /// No TXT record exists at the heartbeat FQDN
    #[error("Heartbeat TXT record '{fqdn}' not found")]
    Missing {
        /// Heartbeat FQDN that was checked
        fqdn: String,
    },

    /// The TXT record does not carry a parseable timestamp
    #[error("Heartbeat TXT record '{fqdn}' has malformed timestamp '{value}'")]
    Malformed {
        /// Heartbeat FQDN that was checked
        fqdn: String,
        /// Raw TXT content
        value: String,
    },

    /// The TXT lookup itself failed
    #[error("Failed to read heartbeat TXT record '{fqdn}': {reason}")]
    Lookup {
        /// Heartbeat FQDN that was checked
        fqdn: String,
        /// Underlying DNS failure
        reason: String,
    },
}

impl SplitBrainError {
    /// Returns true for the "Gone" class: the remote answered but is stale.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

/// Errors that can occur while talking to the edge DNS server or a remote
/// cluster's authoritative nameservers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeDnsError {
    /// A query was sent but failed (timeout, refused, SERVFAIL, transport error)
    #[error("DNS query for '{name}' ({record_type}) against {server} failed: {reason}")]
    QueryFailed {
        /// Queried name
        name: String,
        /// Queried record type
        record_type: String,
        /// Server the query was sent to
        server: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// A name could not be parsed as a DNS name
    #[error("Invalid DNS name '{name}': {reason}")]
    InvalidName {
        /// The offending name
        name: String,
        /// Parser message
        reason: String,
    },

    /// A peer has no nameserver in the delegation list to ask
    #[error("No nameserver delegated under '{ns_fqdn}'")]
    NoNameservers {
        /// NS delegation FQDN of the peer
        ns_fqdn: String,
    },

    /// A dynamic update (RFC 2136) was rejected or failed
    #[error("Dynamic update of '{name}' on server {server} failed: {reason}")]
    UpdateFailed {
        /// Updated name
        name: String,
        /// Server the update was sent to
        server: String,
        /// Specific reason for the failure
        reason: String,
    },
}

/// Errors raised while applying a traffic strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// Failover strategy declared without a primary geo-tag
    #[error("Failover strategy requires primaryGeoTag to be set")]
    MissingPrimaryGeoTag,

    /// The primary geo-tag is neither this cluster nor a configured remote
    #[error("Primary geo tag '{geo_tag}' is not part of the configured fleet ({fleet})")]
    UnknownPrimaryGeoTag {
        /// Declared primary geo-tag
        geo_tag: String,
        /// Comma separated list of known geo-tags
        fleet: String,
    },

    /// This cluster is secondary and the primary failed the split-brain guard
    /// or could not be asked about the hostname
    #[error("Primary cluster '{geo_tag}' is stale: {reason}")]
    PrimaryStale {
        /// Declared primary geo-tag
        geo_tag: String,
        /// Why the primary was excluded this cycle
        reason: String,
    },
}

/// Composite error type for the GSLB engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GslbError {
    /// Split-brain guard failure
    #[error(transparent)]
    SplitBrain(#[from] SplitBrainError),

    /// Edge DNS failure
    #[error(transparent)]
    EdgeDns(#[from] EdgeDnsError),

    /// Strategy failure
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// Generic error for operations that don't fit other categories
    #[error("GSLB operation failed: {0}")]
    Generic(String),
}

impl GslbError {
    /// Returns true if this error is transient and the next cycle may succeed
    /// without any change to configuration.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SplitBrain(_)
            | Self::EdgeDns(
                EdgeDnsError::QueryFailed { .. }
                | EdgeDnsError::NoNameservers { .. }
                | EdgeDnsError::UpdateFailed { .. },
            )
            | Self::Strategy(StrategyError::PrimaryStale { .. })
            | Self::Generic(_) => true,

            Self::EdgeDns(EdgeDnsError::InvalidName { .. })
            | Self::Strategy(
                StrategyError::MissingPrimaryGeoTag | StrategyError::UnknownPrimaryGeoTag { .. },
            ) => false,
        }
    }

    /// Returns the Kubernetes status reason code for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::SplitBrain(SplitBrainError::Expired { .. }) => "HeartbeatExpired",
            Self::SplitBrain(SplitBrainError::Missing { .. }) => "HeartbeatMissing",
            Self::SplitBrain(SplitBrainError::Malformed { .. }) => "HeartbeatMalformed",
            Self::SplitBrain(SplitBrainError::Lookup { .. }) => "HeartbeatLookupFailed",

            Self::EdgeDns(EdgeDnsError::QueryFailed { .. }) => "DnsQueryFailed",
            Self::EdgeDns(EdgeDnsError::InvalidName { .. }) => "InvalidDnsName",
            Self::EdgeDns(EdgeDnsError::NoNameservers { .. }) => "NoDelegatedNameservers",
            Self::EdgeDns(EdgeDnsError::UpdateFailed { .. }) => "DnsUpdateFailed",

            Self::Strategy(StrategyError::MissingPrimaryGeoTag) => "MissingPrimaryGeoTag",
            Self::Strategy(StrategyError::UnknownPrimaryGeoTag { .. }) => "UnknownPrimaryGeoTag",
            Self::Strategy(StrategyError::PrimaryStale { .. }) => "PrimaryStale",

            Self::Generic(_) => "GslbOperationFailed",
        }
    }
}

impl From<anyhow::Error> for GslbError {
    fn from(err: anyhow::Error) -> Self {
        Self::Generic(err.to_string())
    }
}

#[cfg(test)]
#[path = "dns_errors_tests.rs"]
mod dns_errors_tests;
