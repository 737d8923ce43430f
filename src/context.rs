// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the `Gslb` controller.
//!
//! The controller hands every reconciliation an `Arc<Context>` holding:
//! - the cluster backend (Kubernetes API access)
//! - the edge DNS client
//! - the resolved controller configuration
//!
//! Both collaborators are trait objects so the reconciler can run against
//! in-memory implementations in tests.

use crate::backend::{ClusterBackend, KubeBackend};
use crate::config::GslbConfig;
use crate::edge_dns::{EdgeDns, HickoryEdgeDns};
use kube::Client;
use std::sync::Arc;

/// Shared context passed to the `Gslb` reconciler.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes API access
    pub backend: Arc<dyn ClusterBackend>,

    /// Edge DNS and peer nameserver access
    pub dns: Arc<dyn EdgeDns>,

    /// Controller configuration, resolved once at startup
    pub config: GslbConfig,
}

impl Context {
    /// Build a context from explicit collaborators.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ClusterBackend>,
        dns: Arc<dyn EdgeDns>,
        config: GslbConfig,
    ) -> Self {
        Self {
            backend,
            dns,
            config,
        }
    }

    /// Build the production context: a kube-backed cluster backend and a hickory
    /// client pointed at the configured edge DNS server.
    #[must_use]
    pub fn from_client(client: Client, config: GslbConfig) -> Self {
        let dns = HickoryEdgeDns::new(config.edge_dns_server);
        Self::new(Arc::new(KubeBackend::new(client)), Arc::new(dns), config)
    }
}
