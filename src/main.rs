//! CephFS SubVolumeGroup Kubernetes Operator
//!
//! Main entry point for the operator. Sets up the Kubernetes client,
//! registers the CRD controller, and runs the reconciliation loop.

use std::sync::Arc;

use kube::Client;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ceph_subvolumegroup_operator::{
    config::OperatorConfig,
    controllers::{self, Context},
    metrics::{self, Metrics},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    info!("Starting CephFS SubVolumeGroup Operator");

    let config = OperatorConfig::from_env()?;

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let metrics = Arc::new(Metrics::new()?);

    // Create shared context
    let context = Arc::new(Context::from_client(client.clone(), &config, metrics.clone()));

    // Start metrics server
    let metrics_handle = tokio::spawn(metrics::serve(config.metrics_port, metrics.clone()));
    info!("Metrics server starting on port {}", config.metrics_port);

    let controller =
        controllers::run_subvolume_group_controller(client, config.watch_namespace.clone(), context);

    // Handle graceful shutdown
    tokio::select! {
        _ = controller => {
            error!("CephFilesystemSubVolumeGroup controller exited");
        }
        _ = metrics_handle => {
            error!("Metrics server exited unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, stopping operator");
        }
    }

    metrics.operator_health.set(0.0);
    info!("CephFS SubVolumeGroup Operator stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kube=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
