//! Kubernetes resource watcher.
//!
//! Watches ByoHost resources for changes and triggers reconciliation. The
//! watcher only carries the resource identity into the reconciler; the
//! reconciler re-reads the host itself, so duplicate delivery of the same
//! identity is harmless.

use std::sync::Arc;

use futures::TryStreamExt;
use kube::Api;
use kube_runtime::watcher;
use tracing::{debug, error, info, warn};

use crate::error::ControllerError;
use crate::reconciler::HostReconciler;
use crate::store::KubeHostStore;
use crds::ByoHost;

/// Watches ByoHost resources for changes.
pub struct Watcher {
    reconciler: Arc<HostReconciler<KubeHostStore>>,
    host_api: Api<ByoHost>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher").finish_non_exhaustive()
    }
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<HostReconciler<KubeHostStore>>, host_api: Api<ByoHost>) -> Self {
        Self {
            reconciler,
            host_api,
        }
    }

    /// Starts watching ByoHost resources.
    pub async fn watch_byo_hosts(&self) -> Result<(), ControllerError> {
        info!("Starting ByoHost watcher");

        let mut stream = Box::pin(watcher(self.host_api.clone(), watcher::Config::default()));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Watcher stream error: {e}")))?
        {
            match event {
                watcher::Event::Apply(host) => {
                    let name = host.metadata.name.as_deref().unwrap_or("<unknown>");
                    info!("ByoHost applied: {}", name);
                    self.reconcile_logged(name).await;
                }
                watcher::Event::Delete(host) => {
                    let name = host.metadata.name.as_deref().unwrap_or("<unknown>");
                    // Deletion does not trigger cleanup; teardown is driven
                    // by the cleanup annotation
                    info!("ByoHost deleted: {}", name);
                }
                watcher::Event::Init => {
                    info!("ByoHost watcher initialized");
                }
                watcher::Event::InitApply(host) => {
                    let name = host.metadata.name.as_deref().unwrap_or("<unknown>");
                    debug!("ByoHost init apply: {}", name);
                    self.reconcile_logged(name).await;
                }
                watcher::Event::InitDone => {
                    info!("ByoHost watcher initialization complete");
                }
            }
        }

        Ok(())
    }

    async fn reconcile_logged(&self, name: &str) {
        match self.reconciler.reconcile(name).await {
            Ok(()) => {}
            // A lost write race is resolved by the redelivered trigger
            Err(ControllerError::Conflict(what)) => {
                warn!("Conflicting update for {}, waiting for re-trigger", what);
            }
            Err(e) => error!("Failed to reconcile ByoHost {}: {}", name, e),
        }
    }
}
