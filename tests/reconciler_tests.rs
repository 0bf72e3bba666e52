//! # Reconciler Unit Tests
//!
//! Tests for the write-planning half of the reconciler, which is pure:
//! given the fetched target (if any) and the projected desired copy, decide
//! between create, conditional update and no-op.
//!
//! These pin the convergence properties that don't need a live apiserver:
//! - Idempotence: a second pass over unchanged state plans no write
//! - Updates rebase only the synced fields and keep system metadata
//! - Error values name the operation that failed

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;

use secret_sync_controller::projection::{desired_synced_secret, overlay_synced_fields};
use secret_sync_controller::reconciler::{plan_ensure, EnsurePlan};

const SYNC_NAMESPACE: &str = "platform-secrets";

fn source_secret(payload: &[(&str, &[u8])]) -> Secret {
    let data = payload
        .iter()
        .map(|(k, v)| ((*k).to_owned(), ByteString(v.to_vec())))
        .collect::<BTreeMap<_, _>>();

    Secret {
        metadata: ObjectMeta {
            namespace: Some("payments".to_owned()),
            name: Some("api-key".to_owned()),
            labels: Some(BTreeMap::from([(
                "app".to_owned(),
                "payments".to_owned(),
            )])),
            ..ObjectMeta::default()
        },
        data: Some(data),
        type_: Some("Opaque".to_owned()),
        ..Secret::default()
    }
}

/// The desired copy as it would come back from the apiserver after a
/// create: same synced fields plus server-managed metadata.
fn stored_copy(desired: &Secret) -> Secret {
    let mut stored = desired.clone();
    stored.metadata.resource_version = Some("4711".to_owned());
    stored.metadata.uid = Some("f3c9a2d0-5b1e-4c6f-9d27-1f8f0a6f0c55".to_owned());
    stored
}

#[test]
fn test_absent_target_plans_create() {
    let source = source_secret(&[("k", b"v1")]);
    let desired = desired_synced_secret(SYNC_NAMESPACE, &source);

    assert_eq!(plan_ensure(None, &desired), EnsurePlan::Create);
}

#[test]
fn test_synced_target_plans_noop() {
    let source = source_secret(&[("k", b"v1")]);
    let desired = desired_synced_secret(SYNC_NAMESPACE, &source);
    let existing = stored_copy(&desired);

    // Nothing changed between passes: the plan must not write
    assert_eq!(plan_ensure(Some(&existing), &desired), EnsurePlan::Noop);
}

#[test]
fn test_second_pass_after_update_is_noop() {
    let source_v1 = source_secret(&[("k", b"v1")]);
    let desired_v1 = desired_synced_secret(SYNC_NAMESPACE, &source_v1);
    let existing = stored_copy(&desired_v1);

    let source_v2 = source_secret(&[("k", b"v2")]);
    let desired_v2 = desired_synced_secret(SYNC_NAMESPACE, &source_v2);

    let EnsurePlan::Update(updated) = plan_ensure(Some(&existing), &desired_v2) else {
        panic!("changed payload must plan an update");
    };

    // Re-planning against the written state converges to a no-op
    assert_eq!(plan_ensure(Some(&updated), &desired_v2), EnsurePlan::Noop);
}

#[test]
fn test_reconciler_error_sources_are_preserved() {
    use std::error::Error as _;

    use secret_sync_controller::reconciler::ReconcilerError;

    let conflict = kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_owned(),
        message: "the object has been modified".to_owned(),
        reason: "Conflict".to_owned(),
        code: 409,
    });

    let err = ReconcilerError::UpdateSynced(conflict);
    assert!(err.source().is_some(), "kube error must stay on the chain");
}

#[test]
fn test_error_messages_name_the_failed_operation() {
    use secret_sync_controller::reconciler::ReconcilerError;

    let not_found = || {
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_owned(),
            message: "secrets \"payments-api-key\" not found".to_owned(),
            reason: "NotFound".to_owned(),
            code: 404,
        })
    };

    let err = ReconcilerError::GetSource(not_found());
    assert!(err.to_string().starts_with("failed to fetch source secret"));

    let err = ReconcilerError::DeleteSynced(not_found());
    assert!(err.to_string().starts_with("failed to delete synced secret"));
}

#[test]
fn test_update_rewrites_payload_and_keeps_system_metadata() {
    let source_v1 = source_secret(&[("k", b"v1")]);
    let desired_v1 = desired_synced_secret(SYNC_NAMESPACE, &source_v1);
    let existing = stored_copy(&desired_v1);

    let source_v2 = source_secret(&[("k", b"v2")]);
    let desired_v2 = desired_synced_secret(SYNC_NAMESPACE, &source_v2);

    let EnsurePlan::Update(updated) = plan_ensure(Some(&existing), &desired_v2) else {
        panic!("changed payload must plan an update");
    };

    assert_eq!(updated.data, desired_v2.data, "payload follows the source");
    assert_eq!(
        updated.metadata.resource_version,
        existing.metadata.resource_version,
        "the observed resource version must ride along for the conditional write"
    );
    assert_eq!(
        updated.metadata.uid, existing.metadata.uid,
        "server-managed metadata is not the projection's to change"
    );
}

#[test]
fn test_update_converges_removed_labels() {
    let source = source_secret(&[("k", b"v1")]);
    let desired_with_label = desired_synced_secret(SYNC_NAMESPACE, &source);
    let existing = stored_copy(&desired_with_label);

    // Source loses its "app" label
    let mut relabeled = source.clone();
    relabeled.metadata.labels = None;
    let desired_without_label = desired_synced_secret(SYNC_NAMESPACE, &relabeled);

    let EnsurePlan::Update(updated) = plan_ensure(Some(&existing), &desired_without_label) else {
        panic!("label removal must plan an update");
    };
    let labels = updated.metadata.labels.as_ref().expect("provenance labels remain");
    assert!(
        !labels.contains_key("app"),
        "labels dropped from the source must drop from the copy"
    );
}

#[test]
fn test_overlay_only_touches_synced_fields() {
    let source = source_secret(&[("k", b"v1")]);
    let desired = desired_synced_secret(SYNC_NAMESPACE, &source);

    let mut existing = stored_copy(&desired);
    existing.metadata.finalizers = Some(vec!["example.com/hold".to_owned()]);
    existing.metadata.creation_timestamp = Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
        chrono::Utc::now(),
    ));

    let updated = overlay_synced_fields(&existing, &desired);

    assert_eq!(updated.metadata.finalizers, existing.metadata.finalizers);
    assert_eq!(
        updated.metadata.creation_timestamp,
        existing.metadata.creation_timestamp
    );
    assert_eq!(updated.metadata.labels, desired.metadata.labels);
    assert_eq!(updated.data, desired.data);
}
