// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS collaborators of the reconciler.
//!
//! [`EdgeDns`] covers every DNS interaction of a reconciliation:
//! - reading a peer's heartbeat TXT record from the edge DNS server
//! - reading the flat NS delegation list of the GSLB zone
//! - resolving a hostname against a peer cluster's own nameservers
//! - publishing this cluster's heartbeat with an RFC 2136 dynamic update
//!
//! [`HickoryEdgeDns`] implements it with the synchronous `hickory-client` running on
//! tokio's blocking pool. Every query is bounded by [`DNS_QUERY_TIMEOUT_SECS`], so an
//! unreachable server surfaces as [`EdgeDnsError::QueryFailed`] instead of stalling
//! the reconciliation.

use crate::config::HeartbeatKey;
use crate::constants::{
    DNS_PORT, DNS_QUERY_TIMEOUT_SECS, HEARTBEAT_TTL_SECS, TSIG_FUDGE_TIME_SECS,
};
use crate::dns_errors::EdgeDnsError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::{rdata, DNSClass, Name, RData, Record, RecordType};
use hickory_client::udp::UdpClientConnection;
use hickory_proto::rr::dnssec::tsig::TSigner;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One entry of the NS delegation table: a nameserver name and one of its addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameServer {
    /// Address the nameserver answers on
    pub address: IpAddr,
    /// Nameserver name, without the trailing dot
    pub name: String,
}

impl NameServer {
    #[must_use]
    pub fn new(address: IpAddr, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }
}

/// DNS operations the reconciler relies on.
#[async_trait]
pub trait EdgeDns: Send + Sync {
    /// TXT strings published at `fqdn` on the edge server. Empty if the name has none.
    async fn query_txt(&self, fqdn: &str) -> Result<Vec<String>, EdgeDnsError>;

    /// Flat `{address, name}` delegation list of `zone`, read from the edge server.
    async fn delegation_list(&self, zone: &str) -> Result<Vec<NameServer>, EdgeDnsError>;

    /// A records of `host` as answered by the first of `servers` that responds.
    async fn resolve_a(
        &self,
        host: &str,
        servers: &[IpAddr],
    ) -> Result<Vec<Ipv4Addr>, EdgeDnsError>;

    /// IPv4 addresses of a load balancer hostname, through the system resolver.
    async fn lookup_host(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, EdgeDnsError>;

    /// Replace the TXT record at `fqdn` in `zone` with `value`, signed with `key`.
    async fn publish_heartbeat(
        &self,
        fqdn: &str,
        zone: &str,
        value: &str,
        key: &HeartbeatKey,
    ) -> Result<(), EdgeDnsError>;
}

/// [`EdgeDns`] implementation speaking plain DNS over UDP.
#[derive(Clone, Debug)]
pub struct HickoryEdgeDns {
    server: SocketAddr,
    timeout: Duration,
}

impl HickoryEdgeDns {
    /// Create a client for the given edge DNS server.
    #[must_use]
    pub fn new(server: SocketAddr) -> Self {
        Self {
            server,
            timeout: Duration::from_secs(DNS_QUERY_TIMEOUT_SECS),
        }
    }
}

/// Parse a DNS name as fully qualified, with or without its trailing dot.
///
/// # Errors
///
/// Returns [`EdgeDnsError::InvalidName`] if `name` is not a valid DNS name.
pub fn fqdn_name(name: &str) -> Result<Name, EdgeDnsError> {
    let absolute = format!("{}.", name.trim_end_matches('.'));
    Name::from_str(&absolute).map_err(|e| EdgeDnsError::InvalidName {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn query_failed(
    name: &Name,
    record_type: RecordType,
    server: SocketAddr,
    reason: String,
) -> EdgeDnsError {
    EdgeDnsError::QueryFailed {
        name: name.to_string(),
        record_type: record_type.to_string(),
        server: server.to_string(),
        reason,
    }
}

/// Send one query and return the records of the requested type.
///
/// The authority section is included so that NS sets returned as a referral by
/// the parent zone are seen. NXDOMAIN is an empty answer, not an error.
async fn query(
    server: SocketAddr,
    timeout: Duration,
    name: Name,
    record_type: RecordType,
) -> Result<Vec<Record>, EdgeDnsError> {
    let task_name = name.clone();
    tokio::task::spawn_blocking(move || {
        let conn = UdpClientConnection::with_timeout(server, timeout)
            .map_err(|e| query_failed(&name, record_type, server, e.to_string()))?;
        let client = SyncClient::new(conn);

        let response = client
            .query(&name, DNSClass::IN, record_type)
            .map_err(|e| query_failed(&name, record_type, server, e.to_string()))?;

        match response.response_code() {
            ResponseCode::NoError | ResponseCode::NXDomain => Ok(response
                .answers()
                .iter()
                .chain(response.name_servers().iter())
                .filter(|r| r.record_type() == record_type)
                .cloned()
                .collect()),
            code => Err(query_failed(
                &name,
                record_type,
                server,
                format!("server answered {code:?}"),
            )),
        }
    })
    .await
    .map_err(|e| {
        query_failed(
            &task_name,
            record_type,
            server,
            format!("query task failed: {e}"),
        )
    })?
}

fn a_addresses(records: &[Record]) -> Vec<Ipv4Addr> {
    records
        .iter()
        .filter_map(|r| match r.data() {
            Some(RData::A(a)) => Some(a.0),
            _ => None,
        })
        .collect()
}

/// Flatten resolved nameserver names into delegation entries.
///
/// A name whose A lookup failed is skipped, so one unreachable nameserver does
/// not hide the others.
fn delegation_entries(
    resolved: Vec<(String, Result<Vec<Ipv4Addr>, EdgeDnsError>)>,
) -> Vec<NameServer> {
    let mut delegation = Vec::new();
    for (name, addresses) in resolved {
        match addresses {
            Ok(addresses) => {
                for address in addresses {
                    delegation.push(NameServer::new(IpAddr::V4(address), name.clone()));
                }
            }
            Err(e) => warn!("Skipping nameserver {} of the delegation: {}", name, e),
        }
    }
    delegation
}

fn create_tsig_signer(key: &HeartbeatKey) -> Result<TSigner, String> {
    let key_bytes = BASE64
        .decode(&key.secret)
        .map_err(|e| format!("failed to decode TSIG secret: {e}"))?;
    let key_name = Name::from_str(&key.name).map_err(|e| format!("invalid TSIG key name: {e}"))?;

    TSigner::new(
        key_bytes,
        key.algorithm.to_tsig(),
        key_name,
        u16::try_from(TSIG_FUDGE_TIME_SECS).unwrap_or(300),
    )
    .map_err(|e| format!("failed to create TSIG signer: {e}"))
}

#[async_trait]
impl EdgeDns for HickoryEdgeDns {
    async fn query_txt(&self, fqdn: &str) -> Result<Vec<String>, EdgeDnsError> {
        let name = fqdn_name(fqdn)?;
        let records = query(self.server, self.timeout, name, RecordType::TXT).await?;

        Ok(records
            .iter()
            .filter_map(|r| match r.data() {
                Some(RData::TXT(txt)) => Some(
                    txt.txt_data()
                        .iter()
                        .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect())
    }

    async fn delegation_list(&self, zone: &str) -> Result<Vec<NameServer>, EdgeDnsError> {
        let zone_name = fqdn_name(zone)?;
        let ns_records = query(self.server, self.timeout, zone_name, RecordType::NS).await?;

        let mut ns_names: Vec<Name> = Vec::new();
        for ns_name in ns_records.iter().filter_map(|r| match r.data() {
            Some(RData::NS(ns)) => Some(ns.0.clone()),
            _ => None,
        }) {
            if !ns_names.contains(&ns_name) {
                ns_names.push(ns_name);
            }
        }

        let mut resolved = Vec::with_capacity(ns_names.len());
        for ns_name in ns_names {
            let display = ns_name.to_string().trim_end_matches('.').to_string();
            let addresses = query(self.server, self.timeout, ns_name, RecordType::A)
                .await
                .map(|records| a_addresses(&records));
            resolved.push((display, addresses));
        }
        let delegation = delegation_entries(resolved);

        debug!("Delegation list of {}: {} entries", zone, delegation.len());
        Ok(delegation)
    }

    async fn resolve_a(
        &self,
        host: &str,
        servers: &[IpAddr],
    ) -> Result<Vec<Ipv4Addr>, EdgeDnsError> {
        let name = fqdn_name(host)?;
        let mut last_error = None;

        for server in servers {
            let addr = SocketAddr::new(*server, DNS_PORT);
            match query(addr, self.timeout, name.clone(), RecordType::A).await {
                Ok(records) => return Ok(a_addresses(&records)),
                Err(e) => {
                    debug!("A lookup of {} against {} failed: {}", host, addr, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    async fn lookup_host(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, EdgeDnsError> {
        let resolved = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| EdgeDnsError::QueryFailed {
                name: hostname.to_string(),
                record_type: RecordType::A.to_string(),
                server: "system resolver".to_string(),
                reason: e.to_string(),
            })?;

        let mut addresses: Vec<Ipv4Addr> = Vec::new();
        for addr in resolved {
            if let IpAddr::V4(v4) = addr.ip() {
                if !addresses.contains(&v4) {
                    addresses.push(v4);
                }
            }
        }
        Ok(addresses)
    }

    async fn publish_heartbeat(
        &self,
        fqdn: &str,
        zone: &str,
        value: &str,
        key: &HeartbeatKey,
    ) -> Result<(), EdgeDnsError> {
        let name = fqdn_name(fqdn)?;
        let zone_name = fqdn_name(zone)?;
        let server = self.server;
        let timeout = self.timeout;
        let key = key.clone();
        let value = value.to_string();
        let fqdn_owned = fqdn.to_string();

        let update_failed = move |reason: String| EdgeDnsError::UpdateFailed {
            name: fqdn_owned.clone(),
            server: server.to_string(),
            reason,
        };
        let join_failed = update_failed.clone();

        tokio::task::spawn_blocking(move || {
            let conn = UdpClientConnection::with_timeout(server, timeout)
                .map_err(|e| update_failed(e.to_string()))?;
            let signer = create_tsig_signer(&key).map_err(&update_failed)?;
            let client = SyncClient::with_tsigner(conn, signer);

            let mut record = Record::from_rdata(
                name.clone(),
                HEARTBEAT_TTL_SECS,
                RData::TXT(rdata::TXT::new(vec![value.clone()])),
            );
            record.set_dns_class(DNSClass::IN);

            // Drop the previous timestamp so exactly one TXT string remains.
            let response = client
                .delete_rrset(record.clone(), zone_name.clone())
                .map_err(|e| update_failed(e.to_string()))?;
            if response.response_code() != ResponseCode::NoError {
                return Err(update_failed(format!(
                    "delete answered {:?}",
                    response.response_code()
                )));
            }

            let response = client
                .append(record, zone_name, false)
                .map_err(|e| update_failed(e.to_string()))?;
            match response.response_code() {
                ResponseCode::NoError => {
                    info!("Published heartbeat {} = {}", name, value);
                    Ok(())
                }
                code => Err(update_failed(format!("append answered {code:?}"))),
            }
        })
        .await
        .map_err(|e| join_failed(format!("update task failed: {e}")))?
    }
}

#[cfg(test)]
#[path = "edge_dns_tests.rs"]
mod edge_dns_tests;
