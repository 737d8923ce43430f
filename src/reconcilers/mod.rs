// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for `Gslb` resources.
//!
//! # Reconciliation Architecture
//!
//! The controller follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `Gslb` resources and the objects they own
//! 2. **Reconcile** - Derive the record set from local health and peer state
//! 3. **Update** - Replace the `DNSEndpoint` consumed by external-dns
//! 4. **Status** - Report health, published records and conditions
//!
//! Every cycle is a full recomputation: nothing is carried over from earlier
//! cycles except the conditions' transition times.
//!
//! # Example
//!
//! ```rust,no_run
//! use gslb::context::Context;
//! use gslb::crd::Gslb;
//! use gslb::reconcilers::reconcile_gslb;
//! use std::sync::Arc;
//!
//! async fn handle(ctx: Arc<Context>, gslb: Arc<Gslb>) -> anyhow::Result<()> {
//!     let summary = reconcile_gslb(&ctx, &gslb).await?;
//!     println!("published {} records", summary.published_records);
//!     Ok(())
//! }
//! ```

pub mod gslb;
pub mod resources;
pub mod status;

pub use gslb::reconcile_gslb;
pub use gslb::types::ReconcileSummary;
