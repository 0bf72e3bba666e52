//! # Secret Watch
//!
//! Drives the reconciler from a watch over Secrets in all namespaces.
//!
//! The loop consumes raw watcher events instead of the controller runtime:
//! the runtime resolves triggers through its in-memory store and silently
//! skips objects that are already gone, but a deletion is exactly the event
//! that must reach the reconciler here. Relist events (`InitApply`) double
//! as resync, so a fresh start converges every existing source.

use std::sync::Arc;

use futures::{pin_mut, StreamExt};
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use kube_runtime::{watcher, WatchStreamExt};
use tracing::{debug, error, warn};

use crate::backoff::FibonacciBackoff;
use crate::constants;
use crate::metrics;
use crate::projection::SourceRef;
use crate::reconciler::Reconciler;

/// Consume the secret watch stream until it ends.
///
/// Transient watch errors are retried internally by the stream's backoff;
/// the caller restarts the loop if the stream itself terminates.
pub async fn run_secret_watch(reconciler: Arc<Reconciler>) {
    let sources: Api<Secret> = Api::all(reconciler.client().clone());
    let stream = watcher(sources, watcher::Config::default()).default_backoff();
    pin_mut!(stream);

    while let Some(event) = stream.next().await {
        match event {
            Ok(
                watcher::Event::Apply(secret)
                | watcher::Event::InitApply(secret)
                | watcher::Event::Delete(secret),
            ) => {
                let Some(source) = SourceRef::from_secret(&secret) else {
                    debug!("ignoring watch event for secret without namespace/name");
                    continue;
                };
                // The sync namespace is output, never input; reacting to our
                // own copies would loop the mirror back on itself.
                if source.namespace == reconciler.secrets_namespace() {
                    continue;
                }
                reconcile_with_retry(&reconciler, &source).await;
            }
            Ok(watcher::Event::Init | watcher::Event::InitDone) => {}
            Err(err) => {
                warn!(error = %err, "secret watch error, stream will resume");
            }
        }
    }
}

/// Run one reconcile pass, retrying failures with progressive backoff.
///
/// Once the attempts are exhausted the failure is logged and dropped;
/// the next watch event or relist for the identity triggers a fresh pass.
async fn reconcile_with_retry(reconciler: &Reconciler, source: &SourceRef) {
    let mut backoff = FibonacciBackoff::new(
        constants::RETRY_BACKOFF_MIN_SECS,
        constants::RETRY_BACKOFF_MAX_SECS,
    );

    for attempt in 1..=constants::MAX_RECONCILE_ATTEMPTS {
        match reconciler.reconcile(source).await {
            Ok(()) => return,
            Err(err) => {
                metrics::increment_reconciliation_errors();

                if attempt == constants::MAX_RECONCILE_ATTEMPTS {
                    error!(
                        %source,
                        error = %err,
                        "giving up after {attempt} attempts until the next watch event"
                    );
                    return;
                }

                let delay = backoff.next_backoff();
                let next_attempt_at = chrono::Utc::now()
                    + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::seconds(1));
                warn!(
                    %source,
                    error = %err,
                    "reconcile attempt {attempt}/{} failed, retrying at {}",
                    constants::MAX_RECONCILE_ATTEMPTS,
                    next_attempt_at.to_rfc3339(),
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
