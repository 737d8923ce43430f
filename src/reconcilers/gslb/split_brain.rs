// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Split-brain guard.
//!
//! Before trusting anything a peer publishes, its heartbeat TXT record is read
//! and its timestamp compared with the staleness threshold. A peer whose
//! heartbeat is missing, unreadable or older than the threshold is excluded
//! from the cycle.

use super::types::RemoteCluster;
use crate::dns_errors::SplitBrainError;
use crate::duration::format_duration;
use crate::edge_dns::EdgeDns;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;
use tracing::debug;

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a heartbeat value: RFC 3339, or a zone-less timestamp taken as UTC.
#[must_use]
pub fn parse_heartbeat(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim().trim_matches('"');
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
                .ok()
                .map(|ts| ts.and_utc())
        })
}

/// Validate the TXT strings found at `fqdn` against the threshold.
///
/// The most recent parseable timestamp wins. A timestamp in the future (clock
/// skew between clusters) counts as fresh.
///
/// # Errors
///
/// - [`SplitBrainError::Missing`] when there is no TXT string
/// - [`SplitBrainError::Malformed`] when no string parses as a timestamp
/// - [`SplitBrainError::Expired`] when the newest timestamp is older than `threshold`
pub fn check_heartbeat(
    fqdn: &str,
    txt: &[String],
    now: DateTime<Utc>,
    threshold: Duration,
) -> Result<DateTime<Utc>, SplitBrainError> {
    let Some(first) = txt.first() else {
        return Err(SplitBrainError::Missing {
            fqdn: fqdn.to_string(),
        });
    };

    let newest = txt
        .iter()
        .filter_map(|value| parse_heartbeat(value))
        .max()
        .ok_or_else(|| SplitBrainError::Malformed {
            fqdn: fqdn.to_string(),
            value: first.clone(),
        })?;

    let age = now.signed_duration_since(newest).to_std().unwrap_or_default();
    if age > threshold {
        return Err(SplitBrainError::Expired {
            fqdn: fqdn.to_string(),
            threshold: format_duration(threshold),
        });
    }

    Ok(newest)
}

/// Read the peer's heartbeat and check it.
///
/// # Errors
///
/// Returns [`SplitBrainError::Lookup`] if the TXT query fails, otherwise the
/// errors of [`check_heartbeat`].
pub async fn guard(
    dns: &dyn EdgeDns,
    remote: &RemoteCluster,
    now: DateTime<Utc>,
    threshold: Duration,
) -> Result<DateTime<Utc>, SplitBrainError> {
    let txt = dns
        .query_txt(&remote.heartbeat_fqdn)
        .await
        .map_err(|e| SplitBrainError::Lookup {
            fqdn: remote.heartbeat_fqdn.clone(),
            reason: e.to_string(),
        })?;

    let heartbeat = check_heartbeat(&remote.heartbeat_fqdn, &txt, now, threshold)?;
    debug!(
        "Peer {} heartbeat at {} is within {}",
        remote.geo_tag,
        heartbeat.to_rfc3339(),
        format_duration(threshold)
    );
    Ok(heartbeat)
}

#[cfg(test)]
#[path = "split_brain_tests.rs"]
mod split_brain_tests;
