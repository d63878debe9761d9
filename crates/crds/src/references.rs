//! Kubernetes object references used by the ByoHost CRD
//!
//! Follows the Kubernetes object-reference pattern: a required name plus
//! optional namespace, defaulting to the referencing resource's namespace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to the Secret holding the bootstrap script payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the bootstrap data Secret
    pub name: String,

    /// Namespace of the Secret (defaults to the ByoHost's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SecretReference {
    /// Create a reference in the same namespace as the referencing resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Create a reference with an explicit namespace.
    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

/// Reference to the cluster-api Machine that has claimed a host.
///
/// Presence of this reference on a ByoHost's status means the host is
/// reserved for that Machine; absence means the host is unclaimed. Set by
/// the upstream machine controller, cleared only by host cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MachineReference {
    /// API version of the claiming Machine (e.g., "cluster.x-k8s.io/v1beta1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Kind of the claiming resource (always "Machine" today)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Name of the claiming Machine
    pub name: String,

    /// Namespace of the claiming Machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// UID of the claiming Machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl MachineReference {
    /// Create a reference to a Machine by name and namespace.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: Some("cluster.x-k8s.io/v1beta1".to_string()),
            kind: Some("Machine".to_string()),
            name: name.into(),
            namespace: Some(namespace.into()),
            uid: None,
        }
    }
}
