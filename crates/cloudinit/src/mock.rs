//! Recording mocks for the executor traits
//!
//! In-memory implementations that record every call and can be scripted to
//! fail on a specific file path or command, for unit testing reconciliation
//! and executor ordering without touching the host.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::FileSpec;
use crate::error::CloudInitError;
use crate::executors::{CmdRunner, FileWriter, TemplateRenderer};

/// Mock command runner recording every command it was asked to run.
#[derive(Debug, Clone, Default)]
pub struct MockCmdRunner {
    commands: Arc<Mutex<Vec<String>>>,
    fail_on: Arc<Mutex<HashSet<String>>>,
}

impl MockCmdRunner {
    /// Create a mock that succeeds on every command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given command fail when run.
    pub fn fail_on(&self, cmd: &str) {
        if let Ok(mut set) = self.fail_on.lock() {
            set.insert(cmd.to_string());
        }
    }

    /// Commands run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CmdRunner for MockCmdRunner {
    async fn run(&self, cmd: &str) -> Result<(), CloudInitError> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(cmd.to_string());
        }
        let should_fail = self
            .fail_on
            .lock()
            .map(|set| set.contains(cmd))
            .unwrap_or(false);
        if should_fail {
            Err(CloudInitError::CmdFailed {
                cmd: cmd.to_string(),
                detail: "mock failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Mock file writer recording written specs.
#[derive(Debug, Clone, Default)]
pub struct MockFileWriter {
    written: Arc<Mutex<Vec<FileSpec>>>,
    fail_on: Arc<Mutex<HashSet<String>>>,
}

impl MockFileWriter {
    /// Create a mock that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to the given path fail.
    pub fn fail_on(&self, path: &str) {
        if let Ok(mut set) = self.fail_on.lock() {
            set.insert(path.to_string());
        }
    }

    /// Paths written so far, in order.
    pub fn written_paths(&self) -> Vec<String> {
        self.written
            .lock()
            .map(|w| w.iter().map(|f| f.path.clone()).collect())
            .unwrap_or_default()
    }

    /// Full specs written so far.
    pub fn written(&self) -> Vec<FileSpec> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl FileWriter for MockFileWriter {
    async fn write_file(&self, spec: &FileSpec) -> Result<(), CloudInitError> {
        let should_fail = self
            .fail_on
            .lock()
            .map(|set| set.contains(&spec.path))
            .unwrap_or(false);
        if should_fail {
            return Err(CloudInitError::FileWrite {
                path: spec.path.clone(),
                source: std::io::Error::other("mock failure"),
            });
        }
        if let Ok(mut written) = self.written.lock() {
            written.push(spec.clone());
        }
        Ok(())
    }
}

/// Mock renderer that substitutes nothing and records sources.
#[derive(Debug, Clone, Default)]
pub struct MockTemplateRenderer {
    rendered: Arc<Mutex<Vec<String>>>,
}

impl MockTemplateRenderer {
    /// Create a mock renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Template source paths rendered so far.
    pub fn rendered_sources(&self) -> Vec<String> {
        self.rendered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl TemplateRenderer for MockTemplateRenderer {
    fn render(
        &self,
        source_path: &str,
        template: &str,
        _data: &serde_yaml::Mapping,
    ) -> Result<String, CloudInitError> {
        if let Ok(mut rendered) = self.rendered.lock() {
            rendered.push(source_path.to_string());
        }
        Ok(template.to_string())
    }
}
