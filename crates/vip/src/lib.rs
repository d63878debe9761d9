//! Virtual IP management for the host agent
//!
//! A host that carried its cluster's endpoint IP keeps that address bound to
//! a local interface. Cleanup must release the binding; releasing an address
//! that was never bound is not an error.

pub mod error;
pub mod manager;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use error::VipError;
pub use manager::{IpCmdVipManager, VipManager};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockOutcome, MockVipManager};
