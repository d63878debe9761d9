//! Executor traits and their host implementations
//!
//! The three sub-operations of a bootstrap script run through narrow traits
//! so unit tests can substitute recording mocks for the real disk, shell,
//! and template engine.

use std::path::Path;

use base64::Engine as _;
use tracing::debug;

use crate::config::{FileEncoding, FileSpec};
use crate::error::CloudInitError;

/// Runs a single shell command.
#[async_trait::async_trait]
pub trait CmdRunner: Send + Sync {
    /// Run `cmd`, returning an error on spawn failure or non-zero exit.
    async fn run(&self, cmd: &str) -> Result<(), CloudInitError>;
}

/// Writes one declared file to the host.
#[async_trait::async_trait]
pub trait FileWriter: Send + Sync {
    /// Write the file described by `spec`, creating parent directories.
    async fn write_file(&self, spec: &FileSpec) -> Result<(), CloudInitError>;
}

/// Expands a template source against its declared data.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` (read from `source_path`) with `data`.
    fn render(
        &self,
        source_path: &str,
        template: &str,
        data: &serde_yaml::Mapping,
    ) -> Result<String, CloudInitError>;
}

/// Shells out via `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCmdRunner;

#[async_trait::async_trait]
impl CmdRunner for ShellCmdRunner {
    async fn run(&self, cmd: &str) -> Result<(), CloudInitError> {
        debug!("Running bootstrap command: {}", cmd);
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .await
            .map_err(|e| CloudInitError::CmdFailed {
                cmd: cmd.to_string(),
                detail: format!("failed to spawn: {e}"),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CloudInitError::CmdFailed {
                cmd: cmd.to_string(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

/// Writes files to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFileWriter;

impl DiskFileWriter {
    fn decode_content(spec: &FileSpec) -> Result<Vec<u8>, CloudInitError> {
        match spec.encoding {
            FileEncoding::Plain => Ok(spec.content.clone().into_bytes()),
            FileEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(spec.content.trim())
                .map_err(|e| CloudInitError::ContentDecode {
                    path: spec.path.clone(),
                    source: e,
                }),
        }
    }

    fn parse_permissions(spec: &FileSpec) -> Result<Option<u32>, CloudInitError> {
        match spec.permissions.as_deref() {
            None => Ok(None),
            Some(raw) => u32::from_str_radix(raw, 8).map(Some).map_err(|_| {
                CloudInitError::InvalidPermissions {
                    path: spec.path.clone(),
                    permissions: raw.to_string(),
                }
            }),
        }
    }
}

#[async_trait::async_trait]
impl FileWriter for DiskFileWriter {
    async fn write_file(&self, spec: &FileSpec) -> Result<(), CloudInitError> {
        let content = Self::decode_content(spec)?;
        let mode = Self::parse_permissions(spec)?;
        let io_err = |e: std::io::Error| CloudInitError::FileWrite {
            path: spec.path.clone(),
            source: e,
        };

        if let Some(parent) = Path::new(&spec.path).parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        if spec.append {
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&spec.path)
                .await
                .map_err(io_err)?;
            file.write_all(&content).await.map_err(io_err)?;
        } else {
            tokio::fs::write(&spec.path, &content).await.map_err(io_err)?;
        }

        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&spec.path, std::fs::Permissions::from_mode(mode))
                .await
                .map_err(io_err)?;
        }

        debug!("Wrote bootstrap file {}", spec.path);
        Ok(())
    }
}

/// Renders templates with minijinja; undefined variables are errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniJinjaRenderer;

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(
        &self,
        source_path: &str,
        template: &str,
        data: &serde_yaml::Mapping,
    ) -> Result<String, CloudInitError> {
        let mut env = minijinja::Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        env.render_str(template, minijinja::Value::from_serialize(data))
            .map_err(|e| CloudInitError::Template {
                source_path: source_path.to_string(),
                detail: e.to_string(),
            })
    }
}
