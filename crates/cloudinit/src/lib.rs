//! Bootstrap script execution for the host agent
//!
//! Parses a cloud-init style bootstrap payload (files to write, commands to
//! run, templates to expand) and executes the declared sub-actions in order,
//! halting on the first failure. Partial application is accepted behavior:
//! the reconciler's failure path owns the node reset, this crate never rolls
//! back.
//!
//! # Example
//!
//! ```no_run
//! use cloudinit::{DiskFileWriter, MiniJinjaRenderer, ScriptExecutor, ShellCmdRunner};
//!
//! # async fn example(payload: &[u8]) -> Result<(), cloudinit::CloudInitError> {
//! let executor = ScriptExecutor {
//!     file_writer: &DiskFileWriter,
//!     cmd_runner: &ShellCmdRunner,
//!     template_renderer: &MiniJinjaRenderer,
//! };
//! executor.execute(payload).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executors;
pub mod script;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use config::{BootstrapConfig, FileEncoding, FileSpec, TemplateSpec};
pub use error::CloudInitError;
pub use executors::{
    CmdRunner, DiskFileWriter, FileWriter, MiniJinjaRenderer, ShellCmdRunner, TemplateRenderer,
};
pub use script::ScriptExecutor;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockCmdRunner, MockFileWriter, MockTemplateRenderer};
