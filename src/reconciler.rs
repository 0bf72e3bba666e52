//! # Reconciler
//!
//! Core reconciliation logic for syncing source Secrets into the central
//! sync namespace.
//!
//! One pass per source identity:
//!
//! 1. Fetch the source Secret. Absent → run cleanup.
//! 2. Ask the eligibility policy. Ineligible → run cleanup.
//! 3. Project the desired synced copy and ensure it exists with the
//!    projected content.
//!
//! Every decision is recomputed from freshly read state, so a pass is
//! idempotent and safe to retry after any failure. Absence on a lookup is
//! an expected branch, never an error; every other API failure propagates
//! to the caller, which owns retry and backoff.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, ResourceExt};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::metrics;
use crate::policy::SyncEligibility;
use crate::projection::{self, SourceRef};

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch source secret: {0}")]
    GetSource(#[source] kube::Error),
    #[error("failed to fetch synced secret: {0}")]
    GetSynced(#[source] kube::Error),
    #[error("failed to create synced secret: {0}")]
    CreateSynced(#[source] kube::Error),
    #[error("failed to update synced secret: {0}")]
    UpdateSynced(#[source] kube::Error),
    #[error("failed to delete synced secret: {0}")]
    DeleteSynced(#[source] kube::Error),
}

/// What a completed ensure pass did to the synced copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Write planned for the synced copy, derived purely from observed state.
#[derive(Debug, Clone, PartialEq)]
pub enum EnsurePlan {
    /// No copy exists; create it exactly as projected.
    Create,
    /// A copy exists with differing synced fields; write this rebased object.
    Update(Box<Secret>),
    /// The copy already matches the projection.
    Noop,
}

/// Decide what the ensure step must write, given the fetched target (if
/// any) and the projected desired copy.
///
/// The update object is the existing one with only the synced fields
/// rebased, so it still carries the observed resource version: writing it
/// back is conditional, and a concurrent modification surfaces as a
/// conflict instead of being clobbered.
#[must_use]
pub fn plan_ensure(existing: Option<&Secret>, desired: &Secret) -> EnsurePlan {
    match existing {
        None => EnsurePlan::Create,
        Some(existing) => {
            let updated = projection::overlay_synced_fields(existing, desired);
            if updated == *existing {
                EnsurePlan::Noop
            } else {
                EnsurePlan::Update(Box::new(updated))
            }
        }
    }
}

pub struct Reconciler {
    client: Client,
    secrets_namespace: String,
    policy: Arc<dyn SyncEligibility>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("secrets_namespace", &self.secrets_namespace)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Client, config: &ControllerConfig, policy: Arc<dyn SyncEligibility>) -> Self {
        Self {
            client,
            secrets_namespace: config.secrets_namespace.clone(),
            policy,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn secrets_namespace(&self) -> &str {
        &self.secrets_namespace
    }

    /// Converge the synced copy for one source identity.
    ///
    /// `Ok(())` means converged; `Err` means the pass must be retried by
    /// the caller. Idempotent: a second pass over unchanged state performs
    /// no mutating API calls.
    pub async fn reconcile(&self, source: &SourceRef) -> Result<(), ReconcilerError> {
        let start = Instant::now();
        metrics::increment_reconciliations();
        debug!(%source, "reconciling source secret");

        let sources: Api<Secret> = Api::namespaced(self.client.clone(), &source.namespace);
        let original = match sources
            .get_opt(&source.name)
            .await
            .map_err(ReconcilerError::GetSource)?
        {
            Some(secret) => secret,
            None => {
                // Deleted or not yet visible; either way the copy must go.
                debug!(%source, "source secret absent, cleaning up synced copy");
                self.cleanup_synced_secret(source).await?;
                metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
                return Ok(());
            }
        };

        if !self.policy.is_eligible(&self.client, &original).await {
            debug!(%source, "source secret not eligible, cleaning up synced copy");
            self.cleanup_synced_secret(source).await?;
            metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
            return Ok(());
        }

        let desired = projection::desired_synced_secret(&self.secrets_namespace, &original);
        let outcome = self.ensure_synced_secret(&desired).await?;
        match outcome {
            EnsureOutcome::Created => {
                metrics::increment_secrets_created();
                info!(%source, synced = %desired.name_any(), "created synced secret");
            }
            EnsureOutcome::Updated => {
                metrics::increment_secrets_updated();
                info!(%source, synced = %desired.name_any(), "updated synced secret");
            }
            EnsureOutcome::Unchanged => {
                debug!(%source, synced = %desired.name_any(), "synced secret up to date");
            }
        }

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Remove the synced copy for a source that is gone or ineligible.
    ///
    /// The common steady-state case is that no copy exists; that is
    /// convergence, not an error.
    async fn cleanup_synced_secret(&self, source: &SourceRef) -> Result<(), ReconcilerError> {
        let synced: Api<Secret> = Api::namespaced(self.client.clone(), &self.secrets_namespace);
        let name = source.synced_name();

        if synced
            .get_opt(&name)
            .await
            .map_err(ReconcilerError::GetSynced)?
            .is_none()
        {
            return Ok(());
        }

        match synced.delete(&name, &DeleteParams::default()).await {
            Ok(_) => {
                metrics::increment_secrets_deleted();
                info!(%source, synced = %name, "deleted synced secret");
                Ok(())
            }
            // Removed between the lookup and the delete; converged either way
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(()),
            Err(err) => Err(ReconcilerError::DeleteSynced(err)),
        }
    }

    /// Make the synced copy exist with exactly the projected content.
    async fn ensure_synced_secret(
        &self,
        desired: &Secret,
    ) -> Result<EnsureOutcome, ReconcilerError> {
        let synced: Api<Secret> = Api::namespaced(self.client.clone(), &self.secrets_namespace);
        let name = desired.name_any();

        let existing = synced
            .get_opt(&name)
            .await
            .map_err(ReconcilerError::GetSynced)?;

        match plan_ensure(existing.as_ref(), desired) {
            EnsurePlan::Create => {
                synced
                    .create(&PostParams::default(), desired)
                    .await
                    .map_err(ReconcilerError::CreateSynced)?;
                Ok(EnsureOutcome::Created)
            }
            EnsurePlan::Update(updated) => {
                // `updated` carries the resource version read above, so the
                // apiserver rejects this write with a conflict if the copy
                // changed concurrently; the caller retries against fresh state.
                synced
                    .replace(&name, &PostParams::default(), &updated)
                    .await
                    .map_err(ReconcilerError::UpdateSynced)?;
                Ok(EnsureOutcome::Updated)
            }
            EnsurePlan::Noop => Ok(EnsureOutcome::Unchanged),
        }
    }
}
