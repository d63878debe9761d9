//! ByoHost CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the host bootstrap agent.

pub mod byo_host;
pub mod conditions;
pub mod references;

pub use byo_host::*;
pub use conditions::*;
pub use references::*;
