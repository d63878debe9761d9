//! VipManager trait and its ip(8) implementation

use tracing::{debug, info};

use crate::error::VipError;

/// Claims and releases a virtual IP on a local interface.
#[async_trait::async_trait]
pub trait VipManager: Send + Sync {
    /// Bind `address` to `interface`.
    async fn claim(&self, address: &str, interface: &str) -> Result<(), VipError>;

    /// Remove the `address` binding from `interface`. Returns
    /// `VipError::NotConfigured` when no such binding exists.
    async fn release(&self, address: &str, interface: &str) -> Result<(), VipError>;
}

/// Manages address bindings by shelling out to `ip addr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpCmdVipManager;

/// `ip addr del` answers this way when the address is not bound.
const NOT_CONFIGURED_STDERR: &str = "Cannot assign requested address";

impl IpCmdVipManager {
    async fn run_ip(
        verb: &str,
        address: &str,
        interface: &str,
    ) -> Result<std::process::Output, VipError> {
        let cidr = with_prefix(address);
        debug!("ip addr {} {} dev {}", verb, cidr, interface);
        tokio::process::Command::new("ip")
            .args(["addr", verb, &cidr, "dev", interface])
            .output()
            .await
            .map_err(|e| VipError::Command {
                address: address.to_string(),
                interface: interface.to_string(),
                detail: format!("failed to spawn: {e}"),
            })
    }
}

#[async_trait::async_trait]
impl VipManager for IpCmdVipManager {
    async fn claim(&self, address: &str, interface: &str) -> Result<(), VipError> {
        let output = Self::run_ip("add", address, interface).await?;
        if output.status.success() {
            info!("Claimed {} on {}", address, interface);
            Ok(())
        } else {
            Err(VipError::Command {
                address: address.to_string(),
                interface: interface.to_string(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }

    async fn release(&self, address: &str, interface: &str) -> Result<(), VipError> {
        let output = Self::run_ip("del", address, interface).await?;
        if output.status.success() {
            info!("Released {} from {}", address, interface);
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_release_failure(
            address,
            interface,
            &format!("{}: {}", output.status, stderr.trim()),
        ))
    }
}

/// Ensure the address carries a prefix length; bare addresses get /32.
fn with_prefix(address: &str) -> String {
    if address.contains('/') {
        address.to_string()
    } else {
        format!("{address}/32")
    }
}

fn classify_release_failure(address: &str, interface: &str, detail: &str) -> VipError {
    if detail.contains(NOT_CONFIGURED_STDERR) {
        VipError::NotConfigured {
            address: address.to_string(),
            interface: interface.to_string(),
        }
    } else {
        VipError::Command {
            address: address.to_string(),
            interface: interface.to_string(),
            detail: detail.to_string(),
        }
    }
}
