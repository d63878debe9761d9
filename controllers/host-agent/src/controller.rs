//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the host store, the bootstrap executors, and the resource
//! watcher together for the host agent.

use std::path::PathBuf;
use std::sync::Arc;

use kube::{Api, Client};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::ControllerError;
use crate::reconciler::{HostReconciler, NetworkInfo};
use crate::store::KubeHostStore;
use crate::watcher::Watcher;
use cloudinit::{DiskFileWriter, MiniJinjaRenderer, ShellCmdRunner};
use crds::ByoHost;
use vip::IpCmdVipManager;

/// Main controller for the host agent.
#[derive(Debug)]
pub struct Controller {
    host_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        namespace: Option<String>,
        net: NetworkInfo,
        sentinel_path: PathBuf,
    ) -> Result<Self, ControllerError> {
        info!("Initializing host agent");

        // Create Kubernetes client
        let kube_client = Client::try_default().await.map_err(ControllerError::Kube)?;

        let ns = namespace.as_deref().unwrap_or("default");
        let host_api: Api<ByoHost> = Api::namespaced(kube_client.clone(), ns);
        let store = KubeHostStore::new(kube_client, ns);

        let reconciler = HostReconciler::new(
            store,
            Arc::new(ShellCmdRunner),
            Arc::new(DiskFileWriter),
            Arc::new(MiniJinjaRenderer),
            Arc::new(IpCmdVipManager),
            net,
            sentinel_path,
        );

        let watcher_instance = Watcher::new(Arc::new(reconciler), host_api);
        let host_watcher =
            tokio::spawn(async move { watcher_instance.watch_byo_hosts().await });

        Ok(Self { host_watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Host agent running");

        // The watcher should run forever; its exit ends the agent
        tokio::select! {
            result = &mut self.host_watcher => {
                result
                    .map_err(|e| ControllerError::Watch(format!("ByoHost watcher panicked: {e}")))?
                    .map_err(|e| ControllerError::Watch(format!("ByoHost watcher error: {e}")))?;
            }
        }

        Ok(())
    }
}
