//! Controller-specific error types.
//!
//! This module defines error types specific to the host agent that are not
//! covered by upstream library errors.

use thiserror::Error;

use crate::store::StoreError;
use cloudinit::CloudInitError;
use kube::Error as KubeError;
use vip::VipError;

/// Errors that can occur in the host agent.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// ByoHost resource not found
    #[error("ByoHost not found: {0}")]
    HostNotFound(String),

    /// Bootstrap data Secret not found
    #[error("bootstrap secret not found: {0}")]
    SecretNotFound(String),

    /// A concurrent invocation won the status write race; the caller
    /// should re-trigger rather than treat this as a reconcile failure
    #[error("conflicting status update for {0}")]
    Conflict(String),

    /// Bootstrap script execution failed
    #[error("bootstrap execution failed: {0}")]
    Bootstrap(#[from] CloudInitError),

    /// Node reset command failed
    #[error("node reset failed: {0}")]
    Reset(String),

    /// Virtual IP release failed during cleanup
    #[error("virtual IP error: {0}")]
    Vip(#[from] VipError),

    /// Removing the bootstrap sentinel file failed
    #[error("failed to remove bootstrap sentinel file: {0}")]
    Sentinel(#[source] std::io::Error),

    /// Final status write failed; intended state was never recorded
    #[error("failed to persist host status: {0}")]
    Persist(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl From<StoreError> for ControllerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::HostNotFound(what),
            StoreError::Conflict(what) => Self::Conflict(what),
            StoreError::Api(e) => Self::Kube(e),
            StoreError::Serialization(e) => Self::Persist(e.to_string()),
        }
    }
}
