//! # Eligibility Policy
//!
//! Decides whether a source Secret should be synced at all. The reconciler
//! consumes the policy through the narrow [`SyncEligibility`] capability so
//! alternative policies (for example one that checks whether another
//! resource still references the Secret) can be substituted without
//! touching the reconciliation logic.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Client, ResourceExt};

use crate::constants;

/// Capability consumed by the reconciler to decide whether a source Secret
/// is (still) eligible for syncing.
///
/// Implementations receive a client and may perform additional cluster
/// reads; returning `false` causes the reconciler to remove any existing
/// synced copy.
#[async_trait]
pub trait SyncEligibility: Send + Sync {
    async fn is_eligible(&self, client: &Client, source: &Secret) -> bool;
}

/// Default policy: a source opts in by carrying the sync gate label.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelGatedEligibility;

impl LabelGatedEligibility {
    fn sync_requested(source: &Secret) -> bool {
        source
            .labels()
            .get(constants::SYNC_GATE_LABEL)
            .map(String::as_str)
            == Some(constants::SYNC_GATE_ENABLED)
    }
}

#[async_trait]
impl SyncEligibility for LabelGatedEligibility {
    async fn is_eligible(&self, _client: &Client, source: &Secret) -> bool {
        Self::sync_requested(source)
    }
}
