// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster-local collaborators of the reconciler.
//!
//! [`ClusterBackend`] is everything the reconciler reads from or writes to the
//! Kubernetes API: the service/endpoint registry, the routing `Ingress`, the
//! `DNSEndpoint` record set and the `Gslb` status. [`KubeBackend`] implements it
//! with a `kube` client; tests substitute an in-memory implementation.

use crate::constants::{API_GROUP_VERSION, FIELD_MANAGER, KIND_GSLB};
use crate::crd::{DNSEndpoint, Gslb, GslbStatus};
use crate::metrics;
use crate::reconcilers::resources::{create_if_absent, create_or_replace};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Access to the cluster-local state the reconciler depends on.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Look up a service. `Ok(None)` means it does not exist.
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>>;

    /// Look up the endpoints of a service. `Ok(None)` means none were registered.
    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>>;

    /// Create the routing ingress unless it exists, and return the stored object.
    async fn ensure_ingress(&self, ingress: &Ingress) -> Result<Ingress>;

    /// Create the record set, or replace the existing one wholesale.
    async fn replace_dns_endpoint(&self, endpoint: &DNSEndpoint) -> Result<()>;

    /// Overwrite the status of a `Gslb`.
    async fn patch_gslb_status(&self, gslb: &Gslb, status: &GslbStatus) -> Result<()>;
}

/// [`ClusterBackend`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeBackend {
    client: Client,
}

impl KubeBackend {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn namespace_of<K: ResourceExt>(resource: &K) -> Result<String> {
    resource
        .namespace()
        .ok_or_else(|| anyhow::anyhow!("{} has no namespace", resource.name_any()))
}

#[async_trait]
impl ClusterBackend for KubeBackend {
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .with_context(|| format!("Failed to get Service {namespace}/{name}"))
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>> {
        let api: Api<Endpoints> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .with_context(|| format!("Failed to get Endpoints {namespace}/{name}"))
    }

    async fn ensure_ingress(&self, ingress: &Ingress) -> Result<Ingress> {
        let namespace = namespace_of(ingress)?;
        let (stored, created) = create_if_absent(&self.client, &namespace, ingress).await?;
        if created {
            metrics::record_resource_created("Ingress");
        }
        Ok(stored)
    }

    async fn replace_dns_endpoint(&self, endpoint: &DNSEndpoint) -> Result<()> {
        let namespace = namespace_of(endpoint)?;
        if create_or_replace(&self.client, &namespace, endpoint).await? {
            metrics::record_resource_created("DNSEndpoint");
        } else {
            metrics::record_resource_updated("DNSEndpoint");
        }
        Ok(())
    }

    async fn patch_gslb_status(&self, gslb: &Gslb, status: &GslbStatus) -> Result<()> {
        let namespace = namespace_of(gslb)?;
        let name = gslb.name_any();
        let api: Api<Gslb> = Api::namespaced(self.client.clone(), &namespace);

        // Server-side apply drops map keys this manager no longer sets, so hosts
        // removed from the spec vanish from serviceHealth and healthyRecords.
        let patch = json!({
            "apiVersion": API_GROUP_VERSION,
            "kind": KIND_GSLB,
            "status": status,
        });
        api.patch_status(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&patch),
        )
        .await
        .with_context(|| format!("Failed to patch status of Gslb {namespace}/{name}"))?;

        debug!(
            "Updated Gslb {}/{} status: {} host(s), {} published",
            namespace,
            name,
            status.managed_hosts.len(),
            status.healthy_records.len()
        );
        Ok(())
    }
}
