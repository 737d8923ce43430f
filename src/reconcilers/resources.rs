// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic resource creation helpers for Kubernetes resources.
//!
//! # Strategies
//!
//! - **Create if absent**: Create the resource once, never touch it again. Used for
//!   the routing `Ingress`, whose steady state belongs to the ingress controller.
//! - **Replace**: Create the resource, or replace it wholesale. Used for the
//!   `DNSEndpoint`, which is fully owned by this controller.

use anyhow::{Context, Result};
use kube::api::PostParams;
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use tracing::{debug, info};

/// Bounds shared by every namespaced resource these helpers manage.
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + ResourceExt
    + Clone
    + std::fmt::Debug
    + serde::Serialize
    + for<'de> serde::Deserialize<'de>
{
}

impl<T> ManagedResource for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>
{
}

fn resource_name<T: ManagedResource>(resource: &T) -> Result<String> {
    resource
        .meta()
        .name
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Resource must have a name"))
}

/// Create a resource if it does not exist yet.
///
/// An existing resource is returned untouched, so the call is idempotent and never
/// overwrites state written by other controllers.
///
/// # Returns
///
/// The resource as stored by the API server, and whether it was created by this call.
///
/// # Errors
///
/// Returns an error if the resource has no name or an API call fails.
pub async fn create_if_absent<T: ManagedResource>(
    client: &Client,
    namespace: &str,
    resource: &T,
) -> Result<(T, bool)> {
    let name = resource_name(resource)?;
    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    if let Some(existing) = api
        .get_opt(&name)
        .await
        .with_context(|| format!("Failed to get {} {namespace}/{name}", T::kind(&())))?
    {
        debug!("{} {}/{} already exists", T::kind(&()), namespace, name);
        return Ok((existing, false));
    }

    info!("Creating {} {}/{}", T::kind(&()), namespace, name);
    let created = api
        .create(&PostParams::default(), resource)
        .await
        .with_context(|| format!("Failed to create {} {namespace}/{name}", T::kind(&())))?;
    Ok((created, true))
}

/// Create a resource, or replace the existing one wholesale.
///
/// The existing object's `resourceVersion` is carried over so the replace is
/// accepted by the API server.
///
/// # Returns
///
/// `true` if the resource was created, `false` if it was replaced.
///
/// # Errors
///
/// Returns an error if the resource has no name or an API call fails.
pub async fn create_or_replace<T: ManagedResource>(
    client: &Client,
    namespace: &str,
    resource: &T,
) -> Result<bool> {
    let name = resource_name(resource)?;
    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    debug!(
        namespace = %namespace,
        name = %name,
        kind = %T::kind(&()),
        "Creating or replacing resource"
    );

    if let Some(existing) = api
        .get_opt(&name)
        .await
        .with_context(|| format!("Failed to get {} {namespace}/{name}", T::kind(&())))?
    {
        let mut replacement = resource.clone();
        replacement.meta_mut().resource_version = existing.resource_version();
        debug!("Replacing {} {}/{}", T::kind(&()), namespace, name);
        api.replace(&name, &PostParams::default(), &replacement)
            .await
            .with_context(|| format!("Failed to replace {} {namespace}/{name}", T::kind(&())))?;
        Ok(false)
    } else {
        info!("Creating {} {}/{}", T::kind(&()), namespace, name);
        api.create(&PostParams::default(), resource)
            .await
            .with_context(|| format!("Failed to create {} {namespace}/{name}", T::kind(&())))?;
        Ok(true)
    }
}
