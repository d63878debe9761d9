//! Reconciliation logic for ByoHost resources.
//!
//! Level-triggered control loop: each invocation reads a fresh host
//! snapshot, derives its phase, executes exactly one transition's worth of
//! work, and persists the status mutation once at the end via a conditional
//! update. Every transition is idempotent, so redelivered triggers and
//! overlapping invocations for the same host are safe; the stale one loses
//! the conditional write and returns a conflict for the caller to re-trigger.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ControllerError;
use crate::host_state::HostPhase;
use crate::store::{HostStore, StoreError, UpdateScope};
use cloudinit::{CmdRunner, FileWriter, ScriptExecutor, TemplateRenderer};
use crds::{
    get_condition, ByoHost, ConditionSeverity, ConditionStatus, SecretReference,
    BOOTSTRAP_EXECUTION_FAILED_REASON, ENDPOINT_IP_ANNOTATION, K8S_NODE_BOOTSTRAP_SUCCEEDED,
    NODE_ABSENT_REASON, WAITING_FOR_BOOTSTRAP_SECRET_REASON, WAITING_FOR_CLAIM_REASON,
};
use vip::{VipError, VipManager};

/// Idempotent command that removes the node's cluster membership state.
pub const KUBEADM_RESET_COMMAND: &str = "kubeadm reset --force";

/// Default location of the sentinel file kubeadm leaves after a successful
/// bootstrap.
pub const DEFAULT_BOOTSTRAP_SENTINEL_FILE: &str = "/run/cluster-api/bootstrap-success.complete";

/// Local network facts the cleanup path needs, passed in explicitly by the
/// caller instead of read from process-global registration state.
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    /// Interface the cluster endpoint IP is bound to on this host
    pub default_interface: String,
}

/// Reconciles ByoHost resources.
pub struct HostReconciler<S> {
    store: S,
    cmd_runner: Arc<dyn CmdRunner>,
    file_writer: Arc<dyn FileWriter>,
    template_renderer: Arc<dyn TemplateRenderer>,
    vip_manager: Arc<dyn VipManager>,
    net: NetworkInfo,
    sentinel_path: PathBuf,
}

impl<S> std::fmt::Debug for HostReconciler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostReconciler")
            .field("net", &self.net)
            .field("sentinel_path", &self.sentinel_path)
            .finish_non_exhaustive()
    }
}

impl<S: HostStore> HostReconciler<S> {
    /// Creates a new reconciler instance.
    pub fn new(
        store: S,
        cmd_runner: Arc<dyn CmdRunner>,
        file_writer: Arc<dyn FileWriter>,
        template_renderer: Arc<dyn TemplateRenderer>,
        vip_manager: Arc<dyn VipManager>,
        net: NetworkInfo,
        sentinel_path: PathBuf,
    ) -> Self {
        Self {
            store,
            cmd_runner,
            file_writer,
            template_renderer,
            vip_manager,
            net,
            sentinel_path,
        }
    }

    /// Reconciles one ByoHost by name.
    ///
    /// At most one persisted update happens per invocation, at the end, and
    /// only if the branch mutated the in-memory host. A branch error is
    /// returned even when the write also fails; callers observing an error
    /// still see whatever status update could be applied.
    pub async fn reconcile(&self, name: &str) -> Result<(), ControllerError> {
        let mut host = self.store.get(name).await?;
        let phase = HostPhase::of(&host);
        info!("Reconciling ByoHost {} in phase {:?}", name, phase);

        let mut scope = None;
        let branch_result = match phase {
            HostPhase::CleanupRequested => self.host_cleanup(&mut host, &mut scope).await,
            HostPhase::DeletionObserved => self.reconcile_delete(&host),
            HostPhase::Unclaimed => {
                if mark_false_if_needed(
                    &mut host,
                    WAITING_FOR_CLAIM_REASON,
                    ConditionSeverity::Info,
                    "",
                ) {
                    scope = Some(UpdateScope::Status);
                }
                Ok(())
            }
            HostPhase::AwaitingSecret => {
                if mark_false_if_needed(
                    &mut host,
                    WAITING_FOR_BOOTSTRAP_SECRET_REASON,
                    ConditionSeverity::Info,
                    "",
                ) {
                    scope = Some(UpdateScope::Status);
                }
                Ok(())
            }
            HostPhase::Bootstrapping(secret) => {
                self.bootstrap(&mut host, &secret, &mut scope).await
            }
            HostPhase::Bootstrapped => Ok(()),
        };

        if let Some(scope) = scope {
            if let Err(persist_err) = self.store.update(&host, scope).await {
                match branch_result {
                    // The branch error is the diagnostic that matters; the
                    // lost write surfaces on the next trigger anyway.
                    Err(branch_err) => {
                        error!(
                            "Failed to persist ByoHost {} status after error: {}",
                            name, persist_err
                        );
                        return Err(branch_err);
                    }
                    Ok(()) => return Err(map_persist_error(persist_err)),
                }
            }
        }
        branch_result
    }

    /// Run the bootstrap script for a claimed host with bootstrap data.
    async fn bootstrap(
        &self,
        host: &mut ByoHost,
        secret: &SecretReference,
        scope: &mut Option<UpdateScope>,
    ) -> Result<(), ControllerError> {
        let namespace = secret
            .namespace
            .as_deref()
            .or(host.metadata.namespace.as_deref())
            .unwrap_or("default")
            .to_string();
        let payload = self
            .store
            .get_bootstrap_secret(&secret.name, &namespace)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(what) => ControllerError::SecretNotFound(what),
                other => other.into(),
            })?;

        let executor = ScriptExecutor {
            file_writer: self.file_writer.as_ref(),
            cmd_runner: self.cmd_runner.as_ref(),
            template_renderer: self.template_renderer.as_ref(),
        };
        match executor.execute(&payload).await {
            Ok(()) => {
                info!("k8s node successfully bootstrapped");
                host.mark_bootstrap_succeeded();
                *scope = Some(UpdateScope::Status);
                Ok(())
            }
            Err(script_err) => {
                error!("error in bootstrapping k8s node: {}", script_err);
                // Best-effort rollback; the script error stays the result
                if let Err(reset_err) = self.reset_node().await {
                    error!("node reset after failed bootstrap also failed: {}", reset_err);
                }
                host.mark_bootstrap_failed(
                    BOOTSTRAP_EXECUTION_FAILED_REASON,
                    ConditionSeverity::Error,
                    &script_err.to_string(),
                );
                *scope = Some(UpdateScope::Status);
                Err(ControllerError::Bootstrap(script_err))
            }
        }
    }

    /// Full teardown of the host's claim, ordered so nothing is cleared
    /// until the irreversible external operations have succeeded.
    async fn host_cleanup(
        &self,
        host: &mut ByoHost,
        scope: &mut Option<UpdateScope>,
    ) -> Result<(), ControllerError> {
        self.reset_node().await?;

        info!("Removing the bootstrap sentinel file...");
        match tokio::fs::remove_file(&self.sentinel_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ControllerError::Sentinel(e)),
        }

        if let Some(endpoint_ip) = host.annotation(ENDPOINT_IP_ANNOTATION).map(str::to_string) {
            match self
                .vip_manager
                .release(&endpoint_ip, &self.net.default_interface)
                .await
            {
                Ok(()) => info!("Released endpoint IP {}", endpoint_ip),
                Err(VipError::NotConfigured { .. }) => {
                    warn!("Endpoint IP {} was not configured, nothing to release", endpoint_ip);
                }
                Err(e) => return Err(e.into()),
            }
        }

        host.clear_claim();
        host.mark_bootstrap_failed(NODE_ABSENT_REASON, ConditionSeverity::Info, "");
        // Annotation and label clears live outside the status subresource
        *scope = Some(UpdateScope::StatusAndMetadata);
        Ok(())
    }

    /// Deletion is observed, not acted on: teardown is driven by the
    /// explicit cleanup annotation, never by resource deletion.
    fn reconcile_delete(&self, host: &ByoHost) -> Result<(), ControllerError> {
        info!(
            "ByoHost {} is being deleted, nothing to do",
            host.metadata.name.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }

    /// Instruct the local node agent to leave its cluster membership.
    /// kubeadm's own idempotence makes this safe on a never-joined node.
    async fn reset_node(&self) -> Result<(), ControllerError> {
        info!("Running kubeadm reset...");
        self.cmd_runner
            .run(KUBEADM_RESET_COMMAND)
            .await
            .map_err(|e| ControllerError::Reset(e.to_string()))?;
        info!("Kubernetes node reset");
        Ok(())
    }
}

/// Set the success condition False with the given reason, skipping the
/// write when the condition already says exactly that. Returns whether the
/// host was mutated.
fn mark_false_if_needed(
    host: &mut ByoHost,
    reason: &str,
    severity: ConditionSeverity,
    message: &str,
) -> bool {
    let already = host.status.as_ref().is_some_and(|s| {
        get_condition(&s.conditions, K8S_NODE_BOOTSTRAP_SUCCEEDED).is_some_and(|c| {
            c.status == ConditionStatus::False
                && c.reason.as_deref() == Some(reason)
                && c.message == message
        })
    });
    if already {
        return false;
    }
    host.mark_bootstrap_failed(reason, severity, message);
    true
}

fn map_persist_error(err: StoreError) -> ControllerError {
    match err {
        StoreError::Conflict(what) => ControllerError::Conflict(what),
        StoreError::NotFound(what) => ControllerError::Persist(format!("{what} disappeared")),
        StoreError::Api(e) => ControllerError::Persist(e.to_string()),
        StoreError::Serialization(e) => ControllerError::Persist(e.to_string()),
    }
}
