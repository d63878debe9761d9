//! Bootstrap execution errors

use thiserror::Error;

/// Errors that can occur while parsing or executing a bootstrap payload
#[derive(Debug, Error)]
pub enum CloudInitError {
    /// Payload is not valid bootstrap YAML
    #[error("invalid bootstrap payload: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Writing a declared file failed
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        /// Destination path of the failed write
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// File content declared as base64 did not decode
    #[error("invalid base64 content for {path}: {source}")]
    ContentDecode {
        /// Destination path of the file
        path: String,
        /// Underlying decode error
        #[source]
        source: base64::DecodeError,
    },

    /// File permissions string is not valid octal
    #[error("invalid permissions {permissions:?} for {path}")]
    InvalidPermissions {
        /// Destination path of the file
        path: String,
        /// The offending permission string
        permissions: String,
    },

    /// A declared command exited non-zero or failed to spawn
    #[error("command {cmd:?} failed: {detail}")]
    CmdFailed {
        /// The command line that failed
        cmd: String,
        /// Exit status and captured stderr, or the spawn error
        detail: String,
    },

    /// Template expansion failed
    #[error("failed to expand template {source_path}: {detail}")]
    Template {
        /// Template source path
        source_path: String,
        /// Render or IO failure detail
        detail: String,
    },
}
