// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration.
//!
//! The reconciler never reads the environment itself. Everything it needs is
//! resolved once at startup into a [`GslbConfig`] and handed to it through the
//! shared [`Context`](crate::context::Context).
//!
//! [`ControllerArgs`] is the process-level surface: every option can be given as a
//! command line flag or through the environment variable named next to it.

use crate::constants::{
    DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_GRACE_SECS, DEFAULT_LEASE_NAME,
    DEFAULT_RECONCILE_INTERVAL_SECS, DEFAULT_RECORD_TTL_SECS, DEFAULT_SPLIT_BRAIN_THRESHOLD_SECS,
    DNS_PORT,
};
use crate::duration::{format_duration, parse_duration};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use hickory_client::rr::rdata::tsig::TsigAlgorithm;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// What a secondary cluster publishes for a failover host when the primary is stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FailoverFallback {
    /// Withhold the host's records for the cycle and report the primary as degraded
    #[default]
    Propagate,
    /// Publish this cluster's own targets until the primary is live again
    #[value(name = "local")]
    LocalOnly,
}

/// HMAC algorithm of the TSIG key used to sign heartbeat updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum HeartbeatKeyAlgorithm {
    HmacMd5,
    HmacSha1,
    HmacSha224,
    #[default]
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl HeartbeatKeyAlgorithm {
    /// The hickory algorithm this maps to.
    #[must_use]
    pub fn to_tsig(self) -> TsigAlgorithm {
        match self {
            Self::HmacMd5 => TsigAlgorithm::HmacMd5,
            Self::HmacSha1 => TsigAlgorithm::HmacSha1,
            Self::HmacSha224 => TsigAlgorithm::HmacSha224,
            Self::HmacSha256 => TsigAlgorithm::HmacSha256,
            Self::HmacSha384 => TsigAlgorithm::HmacSha384,
            Self::HmacSha512 => TsigAlgorithm::HmacSha512,
        }
    }
}

/// TSIG key for RFC 2136 updates of this cluster's heartbeat record.
#[derive(Clone, PartialEq, Eq)]
pub struct HeartbeatKey {
    /// Key name as configured on the edge DNS server
    pub name: String,
    /// HMAC algorithm
    pub algorithm: HeartbeatKeyAlgorithm,
    /// Base64-encoded secret
    pub secret: String,
}

impl std::fmt::Debug for HeartbeatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatKey")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Configuration consumed by the GSLB reconciler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GslbConfig {
    /// Geo-tag of the cluster this controller runs in (e.g., "eu")
    pub cluster_geo_tag: String,

    /// Geo-tags of the peer clusters, in the order they are consulted
    pub ext_geo_tags: Vec<String>,

    /// Parent zone hosting the NS delegation and heartbeat records
    pub edge_dns_zone: String,

    /// Zone delegated to the GSLB clusters (the zone managed hostnames live in)
    pub dns_zone: String,

    /// Edge DNS server used for heartbeat reads/writes and delegation lookups
    pub edge_dns_server: SocketAddr,

    /// Maximum heartbeat age before a remote cluster is considered gone
    pub split_brain_threshold: Duration,

    /// Delay between two reconciliations of the same Gslb
    pub reconcile_interval: Duration,

    /// TTL of published A records, in seconds
    pub record_ttl: i64,

    /// Failover behavior when the primary cluster is stale
    pub failover_fallback: FailoverFallback,

    /// Key for publishing this cluster's own heartbeat; publishing is off without it
    pub heartbeat_key: Option<HeartbeatKey>,
}

impl GslbConfig {
    /// Create a configuration with default thresholds for the given cluster.
    #[must_use]
    pub fn new(
        cluster_geo_tag: impl Into<String>,
        ext_geo_tags: Vec<String>,
        edge_dns_zone: impl Into<String>,
        dns_zone: impl Into<String>,
        edge_dns_server: SocketAddr,
    ) -> Self {
        Self {
            cluster_geo_tag: cluster_geo_tag.into(),
            ext_geo_tags,
            edge_dns_zone: edge_dns_zone.into(),
            dns_zone: dns_zone.into(),
            edge_dns_server,
            split_brain_threshold: Duration::from_secs(DEFAULT_SPLIT_BRAIN_THRESHOLD_SECS),
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            record_ttl: DEFAULT_RECORD_TTL_SECS,
            failover_fallback: FailoverFallback::default(),
            heartbeat_key: None,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The own geo-tag or a zone is empty
    /// - The own geo-tag is listed among the external geo-tags
    /// - An external geo-tag is listed twice
    /// - The split-brain threshold or the reconcile interval is zero
    /// - The record TTL is not positive
    pub fn validate(&self) -> Result<()> {
        if self.cluster_geo_tag.trim().is_empty() {
            bail!("CLUSTER_GEO_TAG must not be empty");
        }
        if self.edge_dns_zone.trim().is_empty() {
            bail!("EDGE_DNS_ZONE must not be empty");
        }
        if self.dns_zone.trim().is_empty() {
            bail!("DNS_ZONE must not be empty");
        }

        let mut seen = HashSet::new();
        for tag in &self.ext_geo_tags {
            if *tag == self.cluster_geo_tag {
                bail!(
                    "External geo tags must not contain this cluster's own geo tag '{}'",
                    self.cluster_geo_tag
                );
            }
            if !seen.insert(tag.as_str()) {
                bail!("Duplicate external geo tag '{tag}'");
            }
        }

        if self.split_brain_threshold.is_zero() {
            bail!("Split brain threshold must be greater than zero");
        }
        if self.reconcile_interval.is_zero() {
            bail!("Reconcile interval must be greater than zero");
        }
        if self.record_ttl <= 0 {
            bail!("DNS record TTL must be positive, got {}", self.record_ttl);
        }

        Ok(())
    }

    /// Whether `geo_tag` names this cluster or one of its configured peers.
    #[must_use]
    pub fn is_fleet_member(&self, geo_tag: &str) -> bool {
        self.cluster_geo_tag == geo_tag || self.ext_geo_tags.iter().any(|t| t == geo_tag)
    }

    /// All fleet geo-tags, own tag first.
    #[must_use]
    pub fn fleet(&self) -> Vec<&str> {
        std::iter::once(self.cluster_geo_tag.as_str())
            .chain(self.ext_geo_tags.iter().map(String::as_str))
            .collect()
    }

    /// Split-brain threshold in the form it is reported to users (e.g., "5m0s").
    #[must_use]
    pub fn threshold_display(&self) -> String {
        format_duration(self.split_brain_threshold)
    }
}

/// Command line and environment surface of the `gslb` controller binary.
#[derive(Parser, Debug)]
#[command(name = "gslb", version, about = "Multi-cluster GSLB controller for Kubernetes")]
pub struct ControllerArgs {
    /// Geo-tag of this cluster
    #[arg(long, env = "CLUSTER_GEO_TAG")]
    pub cluster_geo_tag: String,

    /// Comma separated geo-tags of the peer clusters
    #[arg(long, env = "EXT_GSLB_CLUSTERS_GEO_TAGS", default_value = "")]
    pub ext_gslb_clusters_geo_tags: String,

    /// Parent zone holding NS delegation and heartbeat records
    #[arg(long, env = "EDGE_DNS_ZONE")]
    pub edge_dns_zone: String,

    /// Zone delegated to the GSLB clusters
    #[arg(long, env = "DNS_ZONE")]
    pub dns_zone: String,

    /// Edge DNS server, `ip` or `ip:port`
    #[arg(long, env = "EDGE_DNS_SERVER")]
    pub edge_dns_server: String,

    /// Maximum heartbeat age before a peer is considered gone (e.g., "5m")
    #[arg(long, env = "SPLIT_BRAIN_THRESHOLD", default_value = "5m")]
    pub split_brain_threshold: String,

    /// Delay between reconciliations (e.g., "30s")
    #[arg(long, env = "RECONCILE_REQUEUE_INTERVAL", default_value = "30s")]
    pub reconcile_requeue_interval: String,

    /// TTL of published records in seconds
    #[arg(long, env = "DNS_RECORD_TTL", default_value_t = DEFAULT_RECORD_TTL_SECS)]
    pub dns_record_ttl: i64,

    /// Failover behavior when the primary cluster is stale
    #[arg(
        long,
        env = "FAILOVER_FALLBACK",
        value_enum,
        default_value_t = FailoverFallback::Propagate
    )]
    pub failover_fallback: FailoverFallback,

    /// TSIG key name for heartbeat updates
    #[arg(long, env = "HEARTBEAT_TSIG_KEY_NAME")]
    pub heartbeat_tsig_key_name: Option<String>,

    /// TSIG key algorithm for heartbeat updates
    #[arg(
        long,
        env = "HEARTBEAT_TSIG_KEY_ALGORITHM",
        value_enum,
        default_value_t = HeartbeatKeyAlgorithm::HmacSha256
    )]
    pub heartbeat_tsig_key_algorithm: HeartbeatKeyAlgorithm,

    /// Base64 TSIG secret for heartbeat updates
    #[arg(long, env = "HEARTBEAT_TSIG_KEY_SECRET", hide_env_values = true)]
    pub heartbeat_tsig_key_secret: Option<String>,

    /// Only reconcile while holding the leader lease
    #[arg(long, env = "LEADER_ELECTION", default_value_t = true, action = clap::ArgAction::Set)]
    pub leader_election: bool,

    /// Name of the leader lease
    #[arg(long, env = "LEASE_NAME", default_value = DEFAULT_LEASE_NAME)]
    pub lease_name: String,

    /// Namespace of the leader lease
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    pub lease_namespace: String,

    /// Lease duration in seconds
    #[arg(long, env = "LEASE_DURATION_SECONDS", default_value_t = DEFAULT_LEASE_DURATION_SECS)]
    pub lease_duration_seconds: u64,

    /// Lease grace period in seconds
    #[arg(long, env = "LEASE_GRACE_SECONDS", default_value_t = DEFAULT_LEASE_GRACE_SECS)]
    pub lease_grace_seconds: u64,
}

impl ControllerArgs {
    /// Resolve the reconciler configuration from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration or the server address cannot be parsed, if only
    /// half of the heartbeat key is given, or if [`GslbConfig::validate`] fails.
    pub fn gslb_config(&self) -> Result<GslbConfig> {
        let heartbeat_key = match (
            &self.heartbeat_tsig_key_name,
            &self.heartbeat_tsig_key_secret,
        ) {
            (Some(name), Some(secret)) => Some(HeartbeatKey {
                name: name.clone(),
                algorithm: self.heartbeat_tsig_key_algorithm,
                secret: secret.clone(),
            }),
            (None, None) => None,
            _ => bail!(
                "HEARTBEAT_TSIG_KEY_NAME and HEARTBEAT_TSIG_KEY_SECRET must be set together"
            ),
        };

        let config = GslbConfig {
            cluster_geo_tag: self.cluster_geo_tag.trim().to_string(),
            ext_geo_tags: parse_geo_tags(&self.ext_gslb_clusters_geo_tags),
            edge_dns_zone: self.edge_dns_zone.trim().to_string(),
            dns_zone: self.dns_zone.trim().to_string(),
            edge_dns_server: parse_server_address(&self.edge_dns_server)?,
            split_brain_threshold: parse_duration(&self.split_brain_threshold)
                .context("Invalid SPLIT_BRAIN_THRESHOLD")?,
            reconcile_interval: parse_duration(&self.reconcile_requeue_interval)
                .context("Invalid RECONCILE_REQUEUE_INTERVAL")?,
            record_ttl: self.dns_record_ttl,
            failover_fallback: self.failover_fallback,
            heartbeat_key,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Split a comma separated geo-tag list, dropping blanks and surrounding whitespace.
#[must_use]
pub fn parse_geo_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse a DNS server given as `ip` or `ip:port`; the port defaults to 53.
///
/// # Errors
///
/// Returns an error if the value is neither a socket address nor an IP address.
pub fn parse_server_address(raw: &str) -> Result<SocketAddr> {
    let raw = raw.trim();
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let ip = raw
        .parse::<IpAddr>()
        .with_context(|| format!("Invalid DNS server address: {raw}"))?;
    Ok(SocketAddr::new(ip, DNS_PORT))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
