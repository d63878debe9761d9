//! Resource store abstraction
//!
//! Narrow contract over the Kubernetes API: fetch a ByoHost, read a
//! bootstrap Secret payload, and write the host back as a conditional
//! update keyed on the host's observed resourceVersion. A stale writer gets
//! `StoreError::Conflict` instead of silently overwriting a newer state.

use async_trait::async_trait;
use thiserror::Error;

use crds::ByoHost;

/// Secret data key holding the bootstrap script payload.
pub const BOOTSTRAP_DATA_KEY: &str = "value";

/// Which parts of the host an update must persist.
///
/// Status lives behind the status subresource, so metadata clears need a
/// second write. Status goes first: if the metadata write is then lost, the
/// cleanup annotation is still present and the next trigger re-runs the
/// idempotent cleanup, so the host never sticks in a half-cleaned state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// Conditions / machine ref only
    Status,
    /// Status plus metadata (annotation and label clears during cleanup)
    StatusAndMetadata,
}

/// Errors returned by the resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Resource or secret does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The conditional update lost the race to a newer writer
    #[error("version conflict: {0}")]
    Conflict(String),

    /// Any other Kubernetes API failure
    #[error("api error: {0}")]
    Api(#[from] kube::Error),

    /// Host could not be serialized for the status write
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Store operations the reconciler needs.
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Fetch the named ByoHost, including its current resourceVersion.
    async fn get(&self, name: &str) -> Result<ByoHost, StoreError>;

    /// Persist the host per `scope`. The host carries the resourceVersion
    /// observed at fetch time; a mismatch yields `StoreError::Conflict`.
    async fn update(&self, host: &ByoHost, scope: UpdateScope) -> Result<ByoHost, StoreError>;

    /// Fetch the bootstrap script payload from a Secret's well-known key.
    async fn get_bootstrap_secret(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Vec<u8>, StoreError>;
}

/// Store backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeHostStore {
    client: kube::Client,
    hosts: kube::Api<ByoHost>,
}

impl std::fmt::Debug for KubeHostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeHostStore").finish_non_exhaustive()
    }
}

impl KubeHostStore {
    /// Create a store scoped to one namespace.
    pub fn new(client: kube::Client, namespace: &str) -> Self {
        let hosts = kube::Api::namespaced(client.clone(), namespace);
        Self { client, hosts }
    }

    fn map_api_error(what: String, err: kube::Error) -> StoreError {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => StoreError::NotFound(what),
            kube::Error::Api(ref response) if response.code == 409 => StoreError::Conflict(what),
            other => StoreError::Api(other),
        }
    }
}

#[async_trait]
impl HostStore for KubeHostStore {
    async fn get(&self, name: &str) -> Result<ByoHost, StoreError> {
        self.hosts
            .get(name)
            .await
            .map_err(|e| Self::map_api_error(format!("ByoHost {name}"), e))
    }

    async fn update(&self, host: &ByoHost, scope: UpdateScope) -> Result<ByoHost, StoreError> {
        let name = host
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| StoreError::NotFound("ByoHost without a name".to_string()))?;
        let pp = kube::api::PostParams::default();
        // replace (not patch) so the carried resourceVersion makes the
        // write conditional: the API server rejects stale versions with 409
        let data = serde_json::to_vec(host)?;
        let updated = self
            .hosts
            .replace_status(name, &pp, data)
            .await
            .map_err(|e| Self::map_api_error(format!("ByoHost {name}"), e))?;

        match scope {
            UpdateScope::Status => Ok(updated),
            UpdateScope::StatusAndMetadata => {
                let mut full = host.clone();
                full.metadata.resource_version = updated.metadata.resource_version;
                self.hosts
                    .replace(name, &pp, &full)
                    .await
                    .map_err(|e| Self::map_api_error(format!("ByoHost {name}"), e))
            }
        }
    }

    async fn get_bootstrap_secret(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Vec<u8>, StoreError> {
        let secrets: kube::Api<k8s_openapi::api::core::v1::Secret> =
            kube::Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get(name)
            .await
            .map_err(|e| Self::map_api_error(format!("Secret {namespace}/{name}"), e))?;
        secret
            .data
            .as_ref()
            .and_then(|d| d.get(BOOTSTRAP_DATA_KEY))
            .map(|bytes| bytes.0.clone())
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "Secret {namespace}/{name} has no {BOOTSTRAP_DATA_KEY:?} key"
                ))
            })
    }
}

/// In-memory store for unit tests.
///
/// Hosts carry a numeric resourceVersion bumped on every accepted update;
/// an update whose version does not match the stored one is rejected with
/// `Conflict`, mirroring the API server's optimistic-concurrency behavior.
/// A `Status`-scoped update leaves the stored metadata untouched, mirroring
/// the status subresource.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Recording in-memory HostStore.
    #[derive(Debug, Clone, Default)]
    pub struct MockHostStore {
        hosts: Arc<Mutex<HashMap<String, ByoHost>>>,
        secrets: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
        update_count: Arc<Mutex<usize>>,
        fail_updates: Arc<Mutex<bool>>,
        conflict_next_update: Arc<Mutex<bool>>,
    }

    impl MockHostStore {
        /// Empty store.
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a host; assigns resourceVersion "1" when unset.
        pub fn put_host(&self, mut host: ByoHost) {
            if host.metadata.resource_version.is_none() {
                host.metadata.resource_version = Some("1".to_string());
            }
            let name = host.metadata.name.clone().unwrap_or_default();
            if let Ok(mut hosts) = self.hosts.lock() {
                hosts.insert(name, host);
            }
        }

        /// Seed a bootstrap secret payload.
        pub fn put_secret(&self, name: &str, namespace: &str, payload: &[u8]) {
            if let Ok(mut secrets) = self.secrets.lock() {
                secrets.insert((name.to_string(), namespace.to_string()), payload.to_vec());
            }
        }

        /// Current stored host, if any.
        pub fn host(&self, name: &str) -> Option<ByoHost> {
            self.hosts.lock().ok().and_then(|h| h.get(name).cloned())
        }

        /// Number of accepted updates.
        pub fn update_count(&self) -> usize {
            self.update_count.lock().map(|c| *c).unwrap_or(0)
        }

        /// Make every update fail with a serialization error.
        pub fn fail_updates(&self) {
            if let Ok(mut flag) = self.fail_updates.lock() {
                *flag = true;
            }
        }

        /// Reject the next update with `Conflict`, simulating a concurrent
        /// invocation winning the write race mid-reconcile.
        pub fn conflict_next_update(&self) {
            if let Ok(mut flag) = self.conflict_next_update.lock() {
                *flag = true;
            }
        }
    }

    #[async_trait]
    impl HostStore for MockHostStore {
        async fn get(&self, name: &str) -> Result<ByoHost, StoreError> {
            self.host(name)
                .ok_or_else(|| StoreError::NotFound(format!("ByoHost {name}")))
        }

        async fn update(&self, host: &ByoHost, scope: UpdateScope) -> Result<ByoHost, StoreError> {
            if self.fail_updates.lock().map(|f| *f).unwrap_or(false) {
                return Err(StoreError::Serialization(serde_json::Error::io(
                    std::io::Error::other("mock persistence failure"),
                )));
            }
            let name = host.metadata.name.clone().unwrap_or_default();
            if let Ok(mut flag) = self.conflict_next_update.lock() {
                if *flag {
                    *flag = false;
                    return Err(StoreError::Conflict(format!("ByoHost {name}")));
                }
            }
            let Ok(mut hosts) = self.hosts.lock() else {
                return Err(StoreError::NotFound(name));
            };
            let Some(stored) = hosts.get(&name) else {
                return Err(StoreError::NotFound(format!("ByoHost {name}")));
            };
            if stored.metadata.resource_version != host.metadata.resource_version {
                return Err(StoreError::Conflict(format!("ByoHost {name}")));
            }

            let mut accepted = match scope {
                UpdateScope::StatusAndMetadata => host.clone(),
                UpdateScope::Status => {
                    // Status subresource semantics: metadata stays as stored
                    let mut copy = stored.clone();
                    copy.status = host.status.clone();
                    copy
                }
            };
            let next: u64 = accepted
                .metadata
                .resource_version
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
                + 1;
            accepted.metadata.resource_version = Some(next.to_string());
            hosts.insert(name, accepted.clone());
            if let Ok(mut count) = self.update_count.lock() {
                *count += 1;
            }
            Ok(accepted)
        }

        async fn get_bootstrap_secret(
            &self,
            name: &str,
            namespace: &str,
        ) -> Result<Vec<u8>, StoreError> {
            self.secrets
                .lock()
                .ok()
                .and_then(|s| s.get(&(name.to_string(), namespace.to_string())).cloned())
                .ok_or_else(|| StoreError::NotFound(format!("Secret {namespace}/{name}")))
        }
    }
}
