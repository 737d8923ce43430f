// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use futures::StreamExt;
use gslb::{
    config::ControllerArgs,
    constants::{
        ERROR_REQUEUE_DURATION_SECS, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH,
        METRICS_SERVER_PORT, TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::{DNSEndpoint, Gslb},
    dns_errors::GslbError,
    metrics,
    reconcilers::reconcile_gslb,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use kube_lease_manager::LeaseManagerBuilder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("gslb-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

fn init_tracing() {
    // RUST_LOG selects the level (default INFO), RUST_LOG_FORMAT=json|text the output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    init_tracing();

    let args = ControllerArgs::parse();
    let config = args.gslb_config().context("Invalid controller configuration")?;

    info!(
        "Starting GSLB controller for geo tag '{}' (peers: {:?})",
        config.cluster_geo_tag, config.ext_geo_tags
    );
    debug!(
        edge_dns_zone = %config.edge_dns_zone,
        dns_zone = %config.dns_zone,
        edge_dns_server = %config.edge_dns_server,
        split_brain_threshold = %config.threshold_display(),
        reconcile_interval = ?config.reconcile_interval,
        failover_fallback = ?config.failover_fallback,
        heartbeat = config.heartbeat_key.is_some(),
        "Controller configuration"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ready = Arc::new(AtomicBool::new(false));
    let ctx = Arc::new(Context::from_client(client.clone(), config));

    // The metrics server and the controller should never exit
    tokio::select! {
        result = run_metrics_server(ready.clone()) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = run_with_leadership(client, ctx, &args, ready) => {
            error!("CRITICAL: Gslb controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Gslb controller exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping GSLB controller");
            Ok(())
        }
    }
}

/// Run the controller, behind the leader lease when leader election is enabled.
async fn run_with_leadership(
    client: Client,
    ctx: Arc<Context>,
    args: &ControllerArgs,
    ready: Arc<AtomicBool>,
) -> Result<()> {
    if !args.leader_election {
        info!("Leader election disabled, reconciling immediately");
        ready.store(true, Ordering::Relaxed);
        return run_gslb_controller(client, ctx).await;
    }

    let identity = std::env::var("POD_NAME")
        .unwrap_or_else(|_| format!("gslb-controller-{}", std::process::id()));

    info!(
        "Waiting for leader lease {}/{} as {}",
        args.lease_namespace, args.lease_name, identity
    );
    let manager = LeaseManagerBuilder::new(client.clone(), &args.lease_name)
        .with_namespace(&args.lease_namespace)
        .with_identity(&identity)
        .with_duration(args.lease_duration_seconds)
        .with_grace(args.lease_grace_seconds)
        .build()
        .await
        .context("Failed to create leader lease manager")?;
    let (mut leader, lease_task) = manager.watch().await;

    // Standby replicas are ready: they serve metrics and wait for the lease
    ready.store(true, Ordering::Relaxed);

    while !*leader.borrow_and_update() {
        leader
            .changed()
            .await
            .context("Leader lease watcher stopped")?;
    }
    info!("Acquired leader lease {}", args.lease_name);
    metrics::record_leader_elected(&identity);

    let result = tokio::select! {
        result = run_gslb_controller(client, ctx) => result,
        result = wait_for_leadership_loss(&mut leader) => {
            metrics::record_leader_lost(&identity);
            result.and_then(|()| Err(anyhow::anyhow!("Lost leader lease {}", args.lease_name)))
        }
    };

    drop(leader);
    match lease_task.await {
        Ok(Ok(_)) => debug!("Leader lease released"),
        Ok(Err(e)) => warn!("Failed to release leader lease: {}", e),
        Err(e) => warn!("Leader lease task failed: {}", e),
    }
    result
}

async fn wait_for_leadership_loss(leader: &mut watch::Receiver<bool>) -> Result<()> {
    while *leader.borrow_and_update() {
        leader
            .changed()
            .await
            .context("Leader lease watcher stopped")?;
    }
    Ok(())
}

/// Run the `Gslb` controller
async fn run_gslb_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting Gslb controller");

    let api = Api::<Gslb>::all(client.clone());
    let ingresses = Api::<Ingress>::all(client.clone());
    let dns_endpoints = Api::<DNSEndpoint>::all(client);

    Controller::new(api, Config::default())
        .owns(ingresses, Config::default())
        .owns(dns_endpoints, Config::default())
        .run(reconcile_gslb_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `Gslb`
async fn reconcile_gslb_wrapper(
    gslb: Arc<Gslb>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_gslb(&ctx, &gslb).await {
        Ok(summary) => {
            metrics::record_reconciliation_success("Gslb", start.elapsed());
            if summary.degraded {
                warn!(
                    "Gslb {} reconciled in degraded mode (excluded peers: {:?})",
                    gslb.name_any(),
                    summary.excluded_peers
                );
            } else {
                info!("Successfully reconciled Gslb: {}", gslb.name_any());
            }
            Ok(Action::requeue(ctx.config.reconcile_interval))
        }
        Err(e) => {
            metrics::record_reconciliation_error("Gslb", start.elapsed());
            match e.downcast_ref::<GslbError>() {
                Some(gslb_error) if !gslb_error.is_transient() => {
                    error!(
                        "Rejected Gslb {} until its configuration is fixed: {:#}",
                        gslb.name_any(),
                        e
                    );
                    metrics::record_error("Gslb", gslb_error.status_reason());
                }
                Some(gslb_error) => {
                    error!("Failed to reconcile Gslb {}: {:#}", gslb.name_any(), e);
                    metrics::record_error("Gslb", gslb_error.status_reason());
                }
                None => error!("Failed to reconcile Gslb {}: {:#}", gslb.name_any(), e),
            }
            Err(e.into())
        }
    }
}

/// Error policy for the `Gslb` controller
fn error_policy(_resource: Arc<Gslb>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Serve `/metrics`, `/healthz` and `/readyz`.
async fn run_metrics_server(ready: Arc<AtomicBool>) -> Result<()> {
    let app = Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/readyz",
            get(move || {
                let ready = ready.clone();
                async move {
                    if ready.load(Ordering::Relaxed) {
                        (StatusCode::OK, "ready")
                    } else {
                        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
                    }
                }
            }),
        );

    let address = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind metrics server to {address}"))?;
    info!("Serving metrics on {}{}", address, METRICS_SERVER_PATH);

    axum::serve(listener, app)
        .await
        .context("Metrics server failed")
}

async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
