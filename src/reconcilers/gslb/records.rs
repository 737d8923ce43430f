// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Builders for the resources the `Gslb` controller owns.
//!
//! - the routing [`Ingress`], named after the `Gslb`, carrying its ingress spec
//! - the [`DNSEndpoint`] record set, named after the `Gslb`, holding for every
//!   serviceable hostname a `localtargets.<host>` record and the public
//!   `<host>` record

use super::types::HostPlan;
use crate::constants::{LOCAL_TARGETS_PREFIX, RECORD_TYPE_A};
use crate::crd::{DNSEndpoint, DNSEndpointSpec, Endpoint, Gslb};
use crate::labels::{
    COMPONENT_RECORD_SET, COMPONENT_ROUTING, DNS_TYPE_LOCAL, GSLB_DNS_TYPE_ANNOTATION,
    GSLB_GEO_TAG_ANNOTATION, K8S_COMPONENT, K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_GSLB,
    PART_OF_GSLB,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

fn owned_metadata(gslb: &Gslb, component: &str) -> ObjectMeta {
    let labels = BTreeMap::from([
        (K8S_COMPONENT.to_string(), component.to_string()),
        (K8S_MANAGED_BY.to_string(), MANAGED_BY_GSLB.to_string()),
        (K8S_PART_OF.to_string(), PART_OF_GSLB.to_string()),
    ]);

    ObjectMeta {
        name: Some(gslb.name_any()),
        namespace: gslb.namespace(),
        labels: Some(labels),
        owner_references: gslb.controller_owner_ref(&()).map(|owner| vec![owner]),
        ..Default::default()
    }
}

/// The `Ingress` routing traffic for the `Gslb`'s hostnames in this cluster.
#[must_use]
pub fn build_ingress(gslb: &Gslb) -> Ingress {
    Ingress {
        metadata: owned_metadata(gslb, COMPONENT_ROUTING),
        spec: Some(gslb.spec.ingress.clone()),
        status: None,
    }
}

/// Name of the record carrying only this cluster's addresses for `host`.
#[must_use]
pub fn local_targets_name(host: &str) -> String {
    format!("{LOCAL_TARGETS_PREFIX}.{host}")
}

fn a_record(dns_name: String, targets: &[Ipv4Addr], ttl: i64) -> Endpoint {
    Endpoint {
        dns_name,
        targets: targets.iter().map(ToString::to_string).collect(),
        record_type: RECORD_TYPE_A.to_string(),
        record_ttl: Some(ttl),
        labels: BTreeMap::new(),
    }
}

/// Records for the given plans, in plan order.
///
/// A hostname that is not serviceable here, or that the strategy withholds,
/// gets no record at all. Otherwise the `localtargets` record is always emitted
/// and the public record only when the strategy yields at least one address.
#[must_use]
pub fn build_endpoints(plans: &[HostPlan], ttl: i64) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();

    for plan in plans
        .iter()
        .filter(|p| p.is_serviceable() && !p.is_withheld())
    {
        endpoints.push(a_record(local_targets_name(&plan.host), &plan.local, ttl));

        if let Some(public) = plan.published() {
            endpoints.push(a_record(plan.host.clone(), public, ttl));
        }
    }

    endpoints
}

/// The `DNSEndpoint` record set for the `Gslb`.
#[must_use]
pub fn build_dns_endpoint(gslb: &Gslb, endpoints: Vec<Endpoint>, geo_tag: &str) -> DNSEndpoint {
    let mut metadata = owned_metadata(gslb, COMPONENT_RECORD_SET);
    metadata.annotations = Some(BTreeMap::from([
        (
            GSLB_DNS_TYPE_ANNOTATION.to_string(),
            DNS_TYPE_LOCAL.to_string(),
        ),
        (GSLB_GEO_TAG_ANNOTATION.to_string(), geo_tag.to_string()),
    ]));

    DNSEndpoint {
        metadata,
        spec: DNSEndpointSpec { endpoints },
        status: None,
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
