//! Host phase derivation
//!
//! The host's lifecycle state is not stored as an explicit field; it is
//! derived from field presence on the resource snapshot at the start of
//! each invocation. Deriving it once into a tagged enum keeps the
//! transition logic in the reconciler unambiguous.

use crds::{ByoHost, SecretReference};

/// Lifecycle phase of a host, computed from one resource snapshot.
///
/// Precedence: cleanup wins over deletion, which wins over the
/// claim/bootstrap ladder. Exactly one phase holds per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPhase {
    /// Operator requested teardown via the cleanup annotation
    CleanupRequested,
    /// The resource is being deleted from the store
    DeletionObserved,
    /// No Machine has claimed the host
    Unclaimed,
    /// Claimed, but no bootstrap Secret referenced yet
    AwaitingSecret,
    /// Claimed with bootstrap data; the script has not succeeded yet
    Bootstrapping(SecretReference),
    /// The bootstrap-succeeded condition is True; converged
    Bootstrapped,
}

impl HostPhase {
    /// Derive the phase from a host snapshot.
    pub fn of(host: &ByoHost) -> Self {
        if host.cleanup_requested() {
            return Self::CleanupRequested;
        }
        if host.metadata.deletion_timestamp.is_some() {
            return Self::DeletionObserved;
        }
        if host.machine_ref().is_none() {
            return Self::Unclaimed;
        }
        match &host.spec.bootstrap_secret {
            None => Self::AwaitingSecret,
            Some(_) if host.bootstrap_succeeded() => Self::Bootstrapped,
            Some(secret) => Self::Bootstrapping(secret.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crds::HOST_CLEANUP_ANNOTATION;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    #[test]
    fn unclaimed_host_has_no_claim() {
        assert_eq!(HostPhase::of(&unclaimed_host("host-01")), HostPhase::Unclaimed);
    }

    #[test]
    fn claimed_without_secret_awaits_secret() {
        assert_eq!(
            HostPhase::of(&claimed_host("host-01")),
            HostPhase::AwaitingSecret
        );
    }

    #[test]
    fn claimed_with_secret_bootstraps() {
        let host = claimed_host_with_secret("host-01", "bootstrap-data");
        match HostPhase::of(&host) {
            HostPhase::Bootstrapping(secret) => assert_eq!(secret.name, "bootstrap-data"),
            other => panic!("expected Bootstrapping, got {other:?}"),
        }
    }

    #[test]
    fn success_condition_short_circuits_bootstrap() {
        let mut host = claimed_host_with_secret("host-01", "bootstrap-data");
        host.mark_bootstrap_succeeded();
        assert_eq!(HostPhase::of(&host), HostPhase::Bootstrapped);
    }

    #[test]
    fn cleanup_annotation_beats_everything() {
        let mut host = claimed_host_with_secret("host-01", "bootstrap-data");
        host.mark_bootstrap_succeeded();
        host.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
        annotate(&mut host, HOST_CLEANUP_ANNOTATION, "");
        assert_eq!(HostPhase::of(&host), HostPhase::CleanupRequested);
    }

    #[test]
    fn deletion_beats_claim_ladder() {
        let mut host = claimed_host("host-01");
        host.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
        assert_eq!(HostPhase::of(&host), HostPhase::DeletionObserved);
    }
}
