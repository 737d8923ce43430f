// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used by the GSLB reconciler.
//!
//! This module defines standard Kubernetes labels and GSLB-specific labels/annotations
//! to ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of` indicating this resource is part of the GSLB operator
pub const PART_OF_GSLB: &str = "gslb";

/// Value for `app.kubernetes.io/managed-by` on objects owned by a `Gslb`
pub const MANAGED_BY_GSLB: &str = "Gslb";

/// Component value for the routing object (`Ingress`)
pub const COMPONENT_ROUTING: &str = "routing";

/// Component value for the desired record set (`DNSEndpoint`)
pub const COMPONENT_RECORD_SET: &str = "record-set";

// ============================================================================
// GSLB-Specific Annotations
// ============================================================================

/// Annotation flagging a `DNSEndpoint` with its origin for the downstream publisher
pub const GSLB_DNS_TYPE_ANNOTATION: &str = "gslb.firestoned.io/dnstype";

/// Value of [`GSLB_DNS_TYPE_ANNOTATION`] for record sets built by this cluster
pub const DNS_TYPE_LOCAL: &str = "local";

/// Annotation recording the geo-tag of the cluster that built a record set
pub const GSLB_GEO_TAG_ANNOTATION: &str = "gslb.firestoned.io/geo-tag";
