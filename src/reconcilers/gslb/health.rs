// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Health classification of managed hostnames.
//!
//! A hostname is backed by the services its ingress rule paths point at. Each
//! service is looked up in the cluster registry:
//!
//! | Registry state                          | Verdict     |
//! |-----------------------------------------|-------------|
//! | no such service                         | `NotFound`  |
//! | service without any ready address       | `Unhealthy` |
//! | service with at least one ready address | `Healthy`   |
//!
//! With several backends the best verdict wins: one healthy backend is enough.

use crate::backend::ClusterBackend;
use crate::crd::HealthStatus;
use anyhow::Result;
use k8s_openapi::api::core::v1::Endpoints;
use tracing::debug;

/// Number of ready addresses across all subsets of an `Endpoints` object.
#[must_use]
pub fn ready_address_count(endpoints: &Endpoints) -> usize {
    endpoints
        .subsets
        .iter()
        .flatten()
        .map(|subset| subset.addresses.as_ref().map_or(0, Vec::len))
        .sum()
}

/// Classify a single service.
///
/// # Errors
///
/// Returns an error if a registry lookup fails. A missing service is a verdict,
/// not an error.
pub async fn classify_service(
    backend: &dyn ClusterBackend,
    namespace: &str,
    service: &str,
) -> Result<HealthStatus> {
    if backend.get_service(namespace, service).await?.is_none() {
        debug!("Service {}/{} not found", namespace, service);
        return Ok(HealthStatus::NotFound);
    }

    let ready = backend
        .get_endpoints(namespace, service)
        .await?
        .as_ref()
        .map_or(0, ready_address_count);

    debug!(
        "Service {}/{} has {} ready address(es)",
        namespace, service, ready
    );
    Ok(if ready > 0 {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    })
}

/// Classify a hostname from the services backing it.
///
/// A hostname without backends is `NotFound`.
///
/// # Errors
///
/// Returns the first registry lookup error encountered.
pub async fn classify_host(
    backend: &dyn ClusterBackend,
    namespace: &str,
    services: &[String],
) -> Result<HealthStatus> {
    let mut verdict = HealthStatus::NotFound;

    for service in services {
        match classify_service(backend, namespace, service).await? {
            HealthStatus::Healthy => return Ok(HealthStatus::Healthy),
            HealthStatus::Unhealthy => verdict = HealthStatus::Unhealthy,
            HealthStatus::NotFound => {}
        }
    }

    Ok(verdict)
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
