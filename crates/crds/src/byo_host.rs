//! ByoHost CRD
//!
//! Declarative record of one bootstrap-capable machine. Created by the host
//! registration flow in the unclaimed state; the agent reconciles it toward
//! registered, bootstrapped, or cleanly reset.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::{
    is_condition_true, set_condition, Condition, ConditionSeverity, K8S_NODE_BOOTSTRAP_SUCCEEDED,
};
use crate::references::{MachineReference, SecretReference};

/// Annotation carrying the virtual IP reserved for this host.
pub const ENDPOINT_IP_ANNOTATION: &str = "byoh.infrastructure.byoh.io/endpoint-ip";
/// Annotation marking an operator-requested teardown of the host's claim.
pub const HOST_CLEANUP_ANNOTATION: &str = "byoh.infrastructure.byoh.io/host-cleanup";
/// Annotation recording the Kubernetes version of the owning cluster.
pub const CLUSTER_VERSION_ANNOTATION: &str = "byoh.infrastructure.byoh.io/k8s-version";
/// Label naming the owning cluster (cluster-api convention).
pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

/// Desired state of a ByoHost.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "infrastructure.byoh.io",
    version = "v1alpha1",
    kind = "ByoHost",
    namespaced,
    status = "ByoHostStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ByoHostSpec {
    /// Reference to the Secret holding the bootstrap script payload.
    /// Set by the upstream machine controller once bootstrap data exists;
    /// only consulted while the host is claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_secret: Option<SecretReference>,
}

/// Observed state of a ByoHost.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ByoHostStatus {
    /// The Machine that has claimed this host. Absent means unclaimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_ref: Option<MachineReference>,

    /// Observed state, keyed by condition type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ByoHost {
    /// The claim, if any.
    pub fn machine_ref(&self) -> Option<&MachineReference> {
        self.status.as_ref().and_then(|s| s.machine_ref.as_ref())
    }

    /// Whether the operator has requested cleanup of this host.
    pub fn cleanup_requested(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .is_some_and(|a| a.contains_key(HOST_CLEANUP_ANNOTATION))
    }

    /// Annotation value, if present.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }

    /// Whether the bootstrap-succeeded condition is True.
    pub fn bootstrap_succeeded(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| is_condition_true(&s.conditions, K8S_NODE_BOOTSTRAP_SUCCEEDED))
    }

    /// Mark the bootstrap-succeeded condition True.
    pub fn mark_bootstrap_succeeded(&mut self) {
        let status = self.status.get_or_insert_with(ByoHostStatus::default);
        set_condition(
            &mut status.conditions,
            Condition::true_(K8S_NODE_BOOTSTRAP_SUCCEEDED),
        );
    }

    /// Mark the bootstrap-succeeded condition False with a reason.
    pub fn mark_bootstrap_failed(
        &mut self,
        reason: &str,
        severity: ConditionSeverity,
        message: &str,
    ) {
        let status = self.status.get_or_insert_with(ByoHostStatus::default);
        set_condition(
            &mut status.conditions,
            Condition::false_(K8S_NODE_BOOTSTRAP_SUCCEEDED, reason, severity, message),
        );
    }

    /// Clear every field tied to the claim: machine ref, cluster-name label,
    /// endpoint-ip / cleanup / cluster-version annotations. Called by the
    /// cleanup path so the clears land in one persisted update.
    pub fn clear_claim(&mut self) {
        if let Some(status) = self.status.as_mut() {
            status.machine_ref = None;
        }
        if let Some(labels) = self.metadata.labels.as_mut() {
            labels.remove(CLUSTER_NAME_LABEL);
        }
        if let Some(annotations) = self.metadata.annotations.as_mut() {
            annotations.remove(ENDPOINT_IP_ANNOTATION);
            annotations.remove(HOST_CLEANUP_ANNOTATION);
            annotations.remove(CLUSTER_VERSION_ANNOTATION);
        }
    }
}
