//! Virtual IP errors

use thiserror::Error;

/// Errors that can occur when claiming or releasing a virtual IP
#[derive(Debug, Error)]
pub enum VipError {
    /// The address is not bound to the interface. Callers releasing an
    /// address treat this as success.
    #[error("address {address} is not configured on {interface}")]
    NotConfigured {
        /// The address that was not found
        address: String,
        /// The interface that was checked
        interface: String,
    },

    /// The ip(8) command failed for another reason
    #[error("ip command failed for {address} on {interface}: {detail}")]
    Command {
        /// The address being managed
        address: String,
        /// The interface being managed
        interface: String,
        /// Exit status and captured stderr, or the spawn error
        detail: String,
    },
}
