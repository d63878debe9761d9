//! Condition types for ByoHost status reporting
//!
//! Models the cluster-api condition convention: a named entry with a truth
//! value, machine-readable reason, severity, and free text. Conditions are
//! the externally observable record of why a host is in its current state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reported by the host agent.
pub const K8S_NODE_BOOTSTRAP_SUCCEEDED: &str = "K8sNodeBootstrapSucceeded";

/// Reason: no Machine has claimed the host yet.
pub const WAITING_FOR_CLAIM_REASON: &str = "WaitingForClaim";
/// Reason: claimed, but the bootstrap data Secret is not referenced yet.
pub const WAITING_FOR_BOOTSTRAP_SECRET_REASON: &str = "WaitingForBootstrapSecret";
/// Reason: the bootstrap script ran and failed.
pub const BOOTSTRAP_EXECUTION_FAILED_REASON: &str = "BootstrapExecutionFailed";
/// Reason: the node was reset and the host returned to the unclaimed pool.
pub const NODE_ABSENT_REASON: &str = "NodeAbsent";

/// Truth value of a condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// The condition cannot be evaluated
    Unknown,
}

/// How severe a false condition is for the resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionSeverity {
    /// The resource cannot make progress without intervention
    Error,
    /// Degraded but recoverable
    Warning,
    /// Expected transient state
    Info,
}

/// A single named status entry on a ByoHost.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (e.g., "K8sNodeBootstrapSucceeded")
    #[serde(rename = "type")]
    pub type_: String,

    /// Truth value
    pub status: ConditionStatus,

    /// Machine-readable reason for the current status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Severity of a False status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ConditionSeverity>,

    /// Human-readable detail
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// When the truth value last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    /// A true condition with no reason.
    pub fn true_(type_: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: ConditionStatus::True,
            reason: None,
            severity: None,
            message: String::new(),
            last_transition_time: Some(Utc::now()),
        }
    }

    /// A false condition with reason, severity and message.
    pub fn false_(type_: &str, reason: &str, severity: ConditionSeverity, message: &str) -> Self {
        Self {
            type_: type_.to_string(),
            status: ConditionStatus::False,
            reason: Some(reason.to_string()),
            severity: Some(severity),
            message: message.to_string(),
            last_transition_time: Some(Utc::now()),
        }
    }
}

/// Replace or append a condition in a list, keyed by type.
///
/// `last_transition_time` is carried over from the existing entry when the
/// truth value did not change, so repeated reconciles of the same state do
/// not churn the timestamp.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        if existing.status == condition.status {
            condition.last_transition_time = existing.last_transition_time;
        }
        *existing = condition;
    } else {
        conditions.push(condition);
    }
}

/// Look up a condition by type.
pub fn get_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Whether the named condition exists and is True.
pub fn is_condition_true(conditions: &[Condition], type_: &str) -> bool {
    get_condition(conditions, type_).is_some_and(|c| c.status == ConditionStatus::True)
}
