//! Host Bootstrap Agent
//!
//! Reconciles `ByoHost` resources toward their desired lifecycle state:
//! registered, bootstrapped into a cluster, or cleanly reset. Runs on the
//! host itself, executing bootstrap scripts, node resets, and virtual IP
//! release as the declared state demands.

mod controller;
mod error;
mod host_state;
mod reconciler;
mod store;
mod watcher;
#[cfg(test)]
mod test_utils;

use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::controller::Controller;
use crate::error::ControllerError;
use crate::reconciler::{NetworkInfo, DEFAULT_BOOTSTRAP_SENTINEL_FILE};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting host agent");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").ok();
    let default_interface = env::var("DEFAULT_NETWORK_INTERFACE").map_err(|_| {
        ControllerError::InvalidConfig(
            "DEFAULT_NETWORK_INTERFACE environment variable is required".to_string(),
        )
    })?;
    let sentinel_path = env::var("BOOTSTRAP_SENTINEL_FILE")
        .unwrap_or_else(|_| DEFAULT_BOOTSTRAP_SENTINEL_FILE.to_string());

    info!("Configuration:");
    info!("  Namespace: {}", namespace.as_deref().unwrap_or("default"));
    info!("  Default interface: {}", default_interface);
    info!("  Sentinel file: {}", sentinel_path);

    // Initialize and run controller
    let controller = Controller::new(
        namespace,
        NetworkInfo { default_interface },
        PathBuf::from(sentinel_path),
    )
    .await?;
    controller.run().await?;

    Ok(())
}
