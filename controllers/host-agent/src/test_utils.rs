//! Test utilities for unit testing the reconciler
//!
//! Fixture builders for ByoHost resources and a harness wiring the
//! reconciler to recording mocks for the store, executors and VIP manager.

use std::path::PathBuf;
use std::sync::Arc;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::reconciler::{HostReconciler, NetworkInfo};
use crate::store::mock::MockHostStore;
use cloudinit::{MockCmdRunner, MockFileWriter, MockTemplateRenderer};
use crds::{ByoHost, ByoHostSpec, ByoHostStatus, MachineReference, SecretReference};
use vip::MockVipManager;

/// A host no Machine has claimed.
pub fn unclaimed_host(name: &str) -> ByoHost {
    ByoHost {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: ByoHostSpec {
            bootstrap_secret: None,
        },
        status: None,
    }
}

/// A host claimed by a Machine, without bootstrap data yet.
pub fn claimed_host(name: &str) -> ByoHost {
    let mut host = unclaimed_host(name);
    host.status = Some(ByoHostStatus {
        machine_ref: Some(MachineReference::new("machine-1", "default")),
        conditions: Vec::new(),
    });
    host
}

/// A claimed host whose bootstrap Secret reference is set.
pub fn claimed_host_with_secret(name: &str, secret_name: &str) -> ByoHost {
    let mut host = claimed_host(name);
    host.spec.bootstrap_secret = Some(SecretReference::new(secret_name));
    host
}

/// Set an annotation on a host.
pub fn annotate(host: &mut ByoHost, key: &str, value: &str) {
    host.metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value.to_string());
}

/// Set a label on a host.
pub fn label(host: &mut ByoHost, key: &str, value: &str) {
    host.metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value.to_string());
}

/// Reconciler under test with handles to all of its mocks.
pub struct Harness {
    pub store: MockHostStore,
    pub cmds: Arc<MockCmdRunner>,
    pub files: Arc<MockFileWriter>,
    pub templates: Arc<MockTemplateRenderer>,
    pub vip: Arc<MockVipManager>,
    pub reconciler: HostReconciler<MockHostStore>,
    // Kept alive so the sentinel path stays valid for the test's duration
    pub sentinel_dir: tempfile::TempDir,
}

impl Harness {
    /// Harness with an absent sentinel file and interface "eth0".
    pub fn new() -> Self {
        let Ok(sentinel_dir) = tempfile::tempdir() else {
            panic!("failed to create sentinel tempdir")
        };
        let sentinel_path = sentinel_dir.path().join("bootstrap-success.complete");
        Self::with_sentinel(sentinel_dir, sentinel_path)
    }

    /// Harness whose sentinel path is occupied by a directory, so removing
    /// it fails with something other than NotFound.
    pub fn with_undeletable_sentinel() -> Self {
        let Ok(sentinel_dir) = tempfile::tempdir() else {
            panic!("failed to create sentinel tempdir")
        };
        let sentinel_path = sentinel_dir.path().join("bootstrap-success.complete");
        assert!(std::fs::create_dir(&sentinel_path).is_ok());
        Self::with_sentinel(sentinel_dir, sentinel_path)
    }

    /// Harness whose sentinel file already exists on disk.
    pub fn with_existing_sentinel() -> Self {
        let Ok(sentinel_dir) = tempfile::tempdir() else {
            panic!("failed to create sentinel tempdir")
        };
        let sentinel_path = sentinel_dir.path().join("bootstrap-success.complete");
        assert!(std::fs::write(&sentinel_path, b"ok").is_ok());
        Self::with_sentinel(sentinel_dir, sentinel_path)
    }

    fn with_sentinel(sentinel_dir: tempfile::TempDir, sentinel_path: PathBuf) -> Self {
        let store = MockHostStore::new();
        let cmds = Arc::new(MockCmdRunner::new());
        let files = Arc::new(MockFileWriter::new());
        let templates = Arc::new(MockTemplateRenderer::new());
        let vip = Arc::new(MockVipManager::new());
        let reconciler = HostReconciler::new(
            store.clone(),
            cmds.clone(),
            files.clone(),
            templates.clone(),
            vip.clone(),
            NetworkInfo {
                default_interface: "eth0".to_string(),
            },
            sentinel_path,
        );
        Self {
            store,
            cmds,
            files,
            templates,
            vip,
            reconciler,
            sentinel_dir,
        }
    }

    /// Number of node resets run so far.
    pub fn reset_count(&self) -> usize {
        self.cmds
            .commands()
            .iter()
            .filter(|c| c.as_str() == crate::reconciler::KUBEADM_RESET_COMMAND)
            .count()
    }
}
