// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # GSLB - Global Server Load Balancing Controller for Kubernetes
//!
//! A Kubernetes controller that runs in every cluster of a fleet and keeps a
//! set of DNS records pointing clients at the clusters able to serve them.
//!
//! ## Overview
//!
//! Each cluster watches `Gslb` resources. For every declared hostname it:
//!
//! - classifies local health from the backing services
//! - reads the addresses of its own ingress load balancer
//! - checks each peer's heartbeat (the split-brain guard) before trusting it
//! - asks live peers which addresses they serve the hostname on
//! - merges the result per the traffic strategy (round robin or failover)
//! - writes a `DNSEndpoint` that external-dns publishes to the edge
//!
//! ## Modules
//!
//! - [`crd`] - `Gslb` and `DNSEndpoint` resource types
//! - [`reconcilers`] - Reconciliation logic
//! - [`config`] - Controller configuration and command line surface
//! - [`backend`] - Kubernetes API access behind a trait
//! - [`edge_dns`] - Edge DNS and peer nameserver access behind a trait
//! - [`context`] - Shared context handed to every reconciliation
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use gslb::crd::{GslbSpec, Strategy, StrategyType};
//! use k8s_openapi::api::networking::v1::{IngressRule, IngressSpec};
//!
//! let spec = GslbSpec {
//!     ingress: IngressSpec {
//!         rules: Some(vec![IngressRule {
//!             host: Some("app.cloud.example.com".to_string()),
//!             http: None,
//!         }]),
//!         ..Default::default()
//!     },
//!     strategy: Strategy {
//!         strategy_type: StrategyType::Failover,
//!         primary_geo_tag: Some("eu".to_string()),
//!     },
//! };
//! assert_eq!(spec.hosts(), vec!["app.cloud.example.com"]);
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod dns_errors;
pub mod duration;
pub mod edge_dns;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
