//! # Projection
//!
//! Pure mapping from an observed source Secret to the desired synced copy.
//! Nothing in this module performs I/O; the reconciler owns all cluster
//! interaction, which keeps the naming and labeling rules trivially
//! testable.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use kube::ResourceExt;

use crate::constants;

/// Identity of a source Secret, as carried by watch events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub namespace: String,
    pub name: String,
}

impl SourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Extract the identity from a watched Secret. Returns `None` for
    /// objects without a namespace or name, which the API server never
    /// delivers in practice.
    pub fn from_secret(secret: &Secret) -> Option<Self> {
        let namespace = secret.namespace()?;
        let name = secret.metadata.name.clone()?;
        Some(Self { namespace, name })
    }

    /// Name of the synced copy derived from this identity.
    ///
    /// Note: the rule is not injective — sources `a-b/c` and `a/b-c` both
    /// derive `a-b-c`. Known ambiguity, kept because downstream consumers
    /// address copies by exactly this name.
    #[must_use]
    pub fn synced_name(&self) -> String {
        synced_secret_name(&self.namespace, &self.name)
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Derive the name of a synced copy from its source identity.
#[must_use]
pub fn synced_secret_name(namespace: &str, name: &str) -> String {
    format!("{namespace}-{name}")
}

/// Compute the desired synced copy for a source Secret.
///
/// The copy lives in `secrets_namespace` under the derived name, carries
/// the source's labels and annotations, and points back at the source via
/// the two owning-secret labels. Those provenance labels are written after
/// the label copy so they always win over colliding source keys. Payload,
/// type and immutability are taken verbatim.
#[must_use]
pub fn desired_synced_secret(secrets_namespace: &str, source: &Secret) -> Secret {
    let source_namespace = source.namespace().unwrap_or_default();
    let source_name = source.name_any();

    let mut labels: BTreeMap<String, String> = source.labels().clone();
    labels.insert(
        constants::OWNING_SECRET_NAMESPACE_LABEL.to_owned(),
        source_namespace.clone(),
    );
    labels.insert(
        constants::OWNING_SECRET_NAME_LABEL.to_owned(),
        source_name.clone(),
    );

    Secret {
        metadata: ObjectMeta {
            namespace: Some(secrets_namespace.to_owned()),
            name: Some(synced_secret_name(&source_namespace, &source_name)),
            labels: Some(labels),
            annotations: source.metadata.annotations.clone(),
            ..ObjectMeta::default()
        },
        immutable: source.immutable,
        data: source.data.clone(),
        string_data: source.string_data.clone(),
        type_: source.type_.clone(),
        ..Secret::default()
    }
}

/// Rebase the synced fields of `desired` onto a copy of the fetched
/// `existing` object.
///
/// Only the fields the projection controls are overwritten; everything the
/// API server manages (resource version, uid, timestamps, managed fields)
/// rides along from `existing`, so a subsequent conditional write cannot
/// clobber concurrently-set system metadata.
#[must_use]
pub fn overlay_synced_fields(existing: &Secret, desired: &Secret) -> Secret {
    let mut updated = existing.clone();
    updated.metadata.labels = desired.metadata.labels.clone();
    updated.metadata.annotations = desired.metadata.annotations.clone();
    updated.immutable = desired.immutable;
    updated.data = desired.data.clone();
    updated.string_data = desired.string_data.clone();
    updated.type_ = desired.type_.clone();
    updated
}
