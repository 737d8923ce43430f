// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory collaborators for reconciler tests.

use crate::backend::ClusterBackend;
use crate::config::{GslbConfig, HeartbeatKey};
use crate::crd::{DNSEndpoint, Gslb, GslbSpec, GslbStatus, Strategy};
use crate::dns_errors::EdgeDnsError;
use crate::edge_dns::{EdgeDns, NameServer};
use anyhow::{bail, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EndpointAddress, EndpointSubset, Endpoints, Service};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressLoadBalancerIngress,
    IngressLoadBalancerStatus, IngressRule, IngressServiceBackend, IngressSpec, IngressStatus,
};
use kube::api::ObjectMeta;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;

pub const NAMESPACE: &str = "test-gslb";
pub const GSLB_NAME: &str = "test-gslb";
pub const EDGE_ZONE: &str = "example.com";
pub const DNS_ZONE: &str = "cloud.example.com";

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

pub fn config(own: &str, ext: &[&str]) -> GslbConfig {
    GslbConfig::new(
        own,
        ext.iter().map(ToString::to_string).collect(),
        EDGE_ZONE,
        DNS_ZONE,
        SocketAddr::new(IpAddr::V4(ip(10, 0, 0, 53)), 53),
    )
}

pub fn rule(host: &str, services: &[&str]) -> IngressRule {
    IngressRule {
        host: Some(host.to_string()),
        http: Some(HTTPIngressRuleValue {
            paths: services
                .iter()
                .map(|svc| HTTPIngressPath {
                    path: Some("/".to_string()),
                    path_type: "Prefix".to_string(),
                    backend: IngressBackend {
                        service: Some(IngressServiceBackend {
                            name: (*svc).to_string(),
                            port: None,
                        }),
                        ..Default::default()
                    },
                })
                .collect(),
        }),
    }
}

/// A `Gslb` declaring `app1`, `app2` and `app3` backed by `app`, `unhealthy-app`
/// and `frontend-podinfo`.
pub fn gslb(strategy: Strategy) -> Gslb {
    let mut gslb = Gslb::new(
        GSLB_NAME,
        GslbSpec {
            ingress: IngressSpec {
                rules: Some(vec![
                    rule("app1.cloud.example.com", &["app"]),
                    rule("app2.cloud.example.com", &["unhealthy-app"]),
                    rule("app3.cloud.example.com", &["frontend-podinfo"]),
                ]),
                ..Default::default()
            },
            strategy,
        },
    );
    gslb.metadata.namespace = Some(NAMESPACE.to_string());
    gslb.metadata.generation = Some(1);
    gslb
}

pub fn endpoints(name: &str, addresses: &[&str]) -> Endpoints {
    let subsets = if addresses.is_empty() {
        None
    } else {
        Some(vec![EndpointSubset {
            addresses: Some(
                addresses
                    .iter()
                    .map(|a| EndpointAddress {
                        ip: (*a).to_string(),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }])
    };
    Endpoints {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        subsets,
    }
}

pub fn load_balancer(entries: &[(Option<&str>, Option<&str>)]) -> IngressStatus {
    IngressStatus {
        load_balancer: Some(IngressLoadBalancerStatus {
            ingress: Some(
                entries
                    .iter()
                    .map(|(ip, hostname)| IngressLoadBalancerIngress {
                        ip: ip.map(ToString::to_string),
                        hostname: hostname.map(ToString::to_string),
                        ..Default::default()
                    })
                    .collect(),
            ),
        }),
    }
}

/// In-memory [`ClusterBackend`] recording every write.
#[derive(Default)]
pub struct FakeBackend {
    pub services: Mutex<HashSet<String>>,
    pub endpoints: Mutex<HashMap<String, Endpoints>>,
    pub failing_services: Mutex<HashSet<String>>,
    pub ingress_status: Mutex<Option<IngressStatus>>,
    pub fail_ingress: Mutex<bool>,
    pub fail_dns_endpoint: Mutex<bool>,
    pub ingresses: Mutex<Vec<Ingress>>,
    pub dns_endpoints: Mutex<Vec<DNSEndpoint>>,
    pub statuses: Mutex<Vec<GslbStatus>>,
    pub writes: Mutex<Vec<&'static str>>,
}

impl FakeBackend {
    /// Registry from the reference scenario: `app` absent, `unhealthy-app` without
    /// addresses, `frontend-podinfo` with one ready address; the ingress reports
    /// `10.0.0.1..3`.
    pub fn scenario() -> Self {
        let backend = Self::default();
        backend.add_service("unhealthy-app", &[]);
        backend.add_service("frontend-podinfo", &["1.2.3.4"]);
        backend.set_ingress_status(load_balancer(&[
            (Some("10.0.0.1"), None),
            (Some("10.0.0.2"), None),
            (Some("10.0.0.3"), None),
        ]));
        backend
    }

    pub fn add_service(&self, name: &str, addresses: &[&str]) {
        self.services.lock().unwrap().insert(name.to_string());
        self.endpoints
            .lock()
            .unwrap()
            .insert(name.to_string(), endpoints(name, addresses));
    }

    pub fn set_ingress_status(&self, status: IngressStatus) {
        *self.ingress_status.lock().unwrap() = Some(status);
    }

    pub fn last_dns_endpoint(&self) -> Option<DNSEndpoint> {
        self.dns_endpoints.lock().unwrap().last().cloned()
    }

    pub fn last_status(&self) -> Option<GslbStatus> {
        self.statuses.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ClusterBackend for FakeBackend {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        if self.failing_services.lock().unwrap().contains(name) {
            bail!("connection refused while reading Service {namespace}/{name}");
        }
        if !self.services.lock().unwrap().contains(name) {
            return Ok(None);
        }
        Ok(Some(Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }))
    }

    async fn get_endpoints(&self, _namespace: &str, name: &str) -> Result<Option<Endpoints>> {
        Ok(self.endpoints.lock().unwrap().get(name).cloned())
    }

    async fn ensure_ingress(&self, ingress: &Ingress) -> Result<Ingress> {
        if *self.fail_ingress.lock().unwrap() {
            bail!("the server is currently unable to handle the request");
        }
        let mut ingresses = self.ingresses.lock().unwrap();
        if ingresses.is_empty() {
            self.writes.lock().unwrap().push("ingress");
            ingresses.push(ingress.clone());
        }
        let mut stored = ingresses[0].clone();
        stored.status = self.ingress_status.lock().unwrap().clone();
        Ok(stored)
    }

    async fn replace_dns_endpoint(&self, endpoint: &DNSEndpoint) -> Result<()> {
        if *self.fail_dns_endpoint.lock().unwrap() {
            bail!("admission webhook denied the request");
        }
        self.writes.lock().unwrap().push("dnsendpoint");
        self.dns_endpoints.lock().unwrap().push(endpoint.clone());
        Ok(())
    }

    async fn patch_gslb_status(&self, _gslb: &Gslb, status: &GslbStatus) -> Result<()> {
        self.writes.lock().unwrap().push("status");
        self.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }
}

/// In-memory [`EdgeDns`].
#[derive(Default)]
pub struct FakeDns {
    pub txt: Mutex<HashMap<String, Vec<String>>>,
    pub failing_txt: Mutex<HashSet<String>>,
    pub delegation: Mutex<Vec<NameServer>>,
    pub fail_delegation: Mutex<bool>,
    /// `(nameserver address, host)` to addresses
    pub a_records: Mutex<HashMap<(IpAddr, String), Vec<Ipv4Addr>>>,
    pub failing_servers: Mutex<HashSet<IpAddr>>,
    pub hostnames: Mutex<HashMap<String, Vec<Ipv4Addr>>>,
    pub fail_heartbeat: Mutex<bool>,
    pub heartbeats: Mutex<Vec<(String, String)>>,
}

impl FakeDns {
    pub fn set_heartbeat(&self, fqdn: &str, value: &str) {
        self.txt
            .lock()
            .unwrap()
            .insert(fqdn.to_string(), vec![value.to_string()]);
    }

    /// Register a peer nameserver and the targets it serves for `host`.
    pub fn add_peer(&self, ns_name: &str, ns_address: IpAddr, host: &str, targets: &[Ipv4Addr]) {
        let mut delegation = self.delegation.lock().unwrap();
        let entry = NameServer::new(ns_address, ns_name);
        if !delegation.contains(&entry) {
            delegation.push(entry);
        }
        self.a_records
            .lock()
            .unwrap()
            .insert((ns_address, host.to_string()), targets.to_vec());
    }
}

#[async_trait]
impl EdgeDns for FakeDns {
    async fn query_txt(&self, fqdn: &str) -> Result<Vec<String>, EdgeDnsError> {
        if self.failing_txt.lock().unwrap().contains(fqdn) {
            return Err(EdgeDnsError::QueryFailed {
                name: fqdn.to_string(),
                record_type: "TXT".to_string(),
                server: "10.0.0.53:53".to_string(),
                reason: "timed out".to_string(),
            });
        }
        Ok(self
            .txt
            .lock()
            .unwrap()
            .get(fqdn)
            .cloned()
            .unwrap_or_default())
    }

    async fn delegation_list(&self, zone: &str) -> Result<Vec<NameServer>, EdgeDnsError> {
        if *self.fail_delegation.lock().unwrap() {
            return Err(EdgeDnsError::QueryFailed {
                name: zone.to_string(),
                record_type: "NS".to_string(),
                server: "10.0.0.53:53".to_string(),
                reason: "SERVFAIL".to_string(),
            });
        }
        Ok(self.delegation.lock().unwrap().clone())
    }

    async fn resolve_a(
        &self,
        host: &str,
        servers: &[IpAddr],
    ) -> Result<Vec<Ipv4Addr>, EdgeDnsError> {
        let mut last_error = None;
        for server in servers {
            if self.failing_servers.lock().unwrap().contains(server) {
                last_error = Some(EdgeDnsError::QueryFailed {
                    name: host.to_string(),
                    record_type: "A".to_string(),
                    server: format!("{server}:53"),
                    reason: "timed out".to_string(),
                });
                continue;
            }
            return Ok(self
                .a_records
                .lock()
                .unwrap()
                .get(&(*server, host.to_string()))
                .cloned()
                .unwrap_or_default());
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    async fn lookup_host(&self, hostname: &str) -> Result<Vec<Ipv4Addr>, EdgeDnsError> {
        self.hostnames
            .lock()
            .unwrap()
            .get(hostname)
            .cloned()
            .ok_or_else(|| EdgeDnsError::QueryFailed {
                name: hostname.to_string(),
                record_type: "A".to_string(),
                server: "system resolver".to_string(),
                reason: "no such host".to_string(),
            })
    }

    async fn publish_heartbeat(
        &self,
        fqdn: &str,
        _zone: &str,
        value: &str,
        _key: &HeartbeatKey,
    ) -> Result<(), EdgeDnsError> {
        if *self.fail_heartbeat.lock().unwrap() {
            return Err(EdgeDnsError::UpdateFailed {
                name: fqdn.to_string(),
                server: "10.0.0.53:53".to_string(),
                reason: "REFUSED".to_string(),
            });
        }
        self.heartbeats
            .lock()
            .unwrap()
            .push((fqdn.to_string(), value.to_string()));
        Ok(())
    }
}
