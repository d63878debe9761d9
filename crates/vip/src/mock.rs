//! Recording mock for the VipManager trait

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::VipError;
use crate::manager::VipManager;

/// Outcome a mock release/claim should produce for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    /// Succeed
    Ok,
    /// Fail with `VipError::NotConfigured`
    NotConfigured,
    /// Fail with `VipError::Command`
    Fail,
}

/// Mock VipManager recording claim/release calls.
#[derive(Debug, Clone, Default)]
pub struct MockVipManager {
    released: Arc<Mutex<Vec<(String, String)>>>,
    claimed: Arc<Mutex<Vec<(String, String)>>>,
    outcomes: Arc<Mutex<HashMap<String, MockOutcome>>>,
}

impl MockVipManager {
    /// Create a mock where every operation succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for operations on `address`.
    pub fn set_outcome(&self, address: &str, outcome: MockOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(address.to_string(), outcome);
        }
    }

    /// (address, interface) pairs released so far.
    pub fn released(&self) -> Vec<(String, String)> {
        self.released.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// (address, interface) pairs claimed so far.
    pub fn claimed(&self) -> Vec<(String, String)> {
        self.claimed.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn outcome_for(&self, address: &str) -> MockOutcome {
        self.outcomes
            .lock()
            .ok()
            .and_then(|o| o.get(address).copied())
            .unwrap_or(MockOutcome::Ok)
    }

    fn result_for(&self, address: &str, interface: &str) -> Result<(), VipError> {
        match self.outcome_for(address) {
            MockOutcome::Ok => Ok(()),
            MockOutcome::NotConfigured => Err(VipError::NotConfigured {
                address: address.to_string(),
                interface: interface.to_string(),
            }),
            MockOutcome::Fail => Err(VipError::Command {
                address: address.to_string(),
                interface: interface.to_string(),
                detail: "mock failure".to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl VipManager for MockVipManager {
    async fn claim(&self, address: &str, interface: &str) -> Result<(), VipError> {
        if let Ok(mut claimed) = self.claimed.lock() {
            claimed.push((address.to_string(), interface.to_string()));
        }
        self.result_for(address, interface)
    }

    async fn release(&self, address: &str, interface: &str) -> Result<(), VipError> {
        if let Ok(mut released) = self.released.lock() {
            released.push((address.to_string(), interface.to_string()));
        }
        self.result_for(address, interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_scripts_outcomes() {
        let mock = MockVipManager::new();
        mock.set_outcome("10.0.0.9", MockOutcome::NotConfigured);

        assert!(mock.release("10.0.0.5", "eth0").await.is_ok());
        assert!(matches!(
            mock.release("10.0.0.9", "eth0").await,
            Err(VipError::NotConfigured { .. })
        ));
        assert_eq!(
            mock.released(),
            vec![
                ("10.0.0.5".to_string(), "eth0".to_string()),
                ("10.0.0.9".to_string(), "eth0".to_string()),
            ]
        );
    }
}
