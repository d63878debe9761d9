//! Bootstrap payload model
//!
//! The payload is cloud-init style YAML with three declared groups:
//! `write_files`, `templates`, and `run_cmd`. Unknown top-level keys are
//! rejected so a malformed payload fails before any side effect runs.

use serde::Deserialize;

use crate::error::CloudInitError;

/// Parsed bootstrap payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Files to write, in declared order
    #[serde(default)]
    pub write_files: Vec<FileSpec>,

    /// Templates to expand, in declared order
    #[serde(default)]
    pub templates: Vec<TemplateSpec>,

    /// Commands to run, in declared order
    #[serde(default, alias = "runCmd")]
    pub run_cmd: Vec<String>,
}

impl BootstrapConfig {
    /// Parse a raw secret payload into a bootstrap config.
    pub fn parse(payload: &[u8]) -> Result<Self, CloudInitError> {
        Ok(serde_yaml::from_slice(payload)?)
    }
}

/// How a file's `content` field is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum FileEncoding {
    /// Content is literal text
    #[default]
    #[serde(rename = "plain")]
    Plain,
    /// Content is base64-encoded bytes
    #[serde(rename = "base64")]
    Base64,
}

/// A single file to write.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSpec {
    /// Absolute destination path
    pub path: String,

    /// Octal permission string (e.g., "0640"); unset keeps the platform default
    #[serde(default)]
    pub permissions: Option<String>,

    /// Content encoding
    #[serde(default)]
    pub encoding: FileEncoding,

    /// Append to an existing file instead of truncating
    #[serde(default)]
    pub append: bool,

    /// File content, encoded per `encoding`
    #[serde(default)]
    pub content: String,
}

/// A single template to expand.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    /// Path of the template source on the host
    pub source: String,

    /// Destination path for the rendered output
    pub destination: String,

    /// Variables available to the template
    #[serde(default)]
    pub data: serde_yaml::Mapping,
}
