//! # Secret Sync Controller
//!
//! A Kubernetes controller that mirrors eligible Secrets into a central
//! sync namespace.
//!
//! ## Overview
//!
//! 1. **Watches Secrets** across all namespaces
//! 2. **Filters by eligibility** - sources opt in via the sync gate label
//! 3. **Projects synced copies** - derived name, provenance labels, payload
//!    copied verbatim into the configured sync namespace
//! 4. **Converges on every event** - create, update, delete or no-op is
//!    re-decided from live reads, so passes are idempotent and retry-safe
//!
//! ## Features
//!
//! - **Level-triggered**: relists double as resync after downtime
//! - **Conditional updates**: concurrent writers surface as conflicts and
//!   the pass retries against fresh state
//! - **Prometheus metrics** and health/readiness probes over HTTP

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use tracing::{error, info, warn};

use secret_sync_controller::config::ControllerConfig;
use secret_sync_controller::policy::LabelGatedEligibility;
use secret_sync_controller::reconciler::Reconciler;
use secret_sync_controller::server::{self, ServerState};
use secret_sync_controller::{constants, metrics, watch};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secret_sync_controller=info".into()),
        )
        .init();

    info!(
        "Starting Secret Sync Controller (build {}, {})",
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );

    let config = ControllerConfig::parse();

    metrics::register_metrics().context("Failed to register metrics")?;

    // Start HTTP server for metrics and probes
    let state = Arc::new(ServerState::default());
    let server_state = Arc::clone(&state);
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(err) = server::serve(metrics_port, server_state).await {
            error!("HTTP server error: {err}");
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    info!(
        secrets_namespace = %config.secrets_namespace,
        "Mirroring eligible secrets"
    );

    let policy = Arc::new(LabelGatedEligibility);
    let reconciler = Arc::new(Reconciler::new(client, &config, policy));

    state.is_ready.store(true, Ordering::Relaxed);

    loop {
        watch::run_secret_watch(Arc::clone(&reconciler)).await;
        warn!(
            "Secret watch stream ended, restarting in {}s",
            constants::WATCH_RESTART_DELAY_SECS
        );
        tokio::time::sleep(Duration::from_secs(constants::WATCH_RESTART_DELAY_SECS)).await;
    }
}
