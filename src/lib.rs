//! # Secret Sync Controller Library
//!
//! Mirrors eligible Kubernetes Secrets into a single central sync
//! namespace. For every source Secret that opts in, the controller keeps a
//! derived copy (`<source-namespace>-<source-name>`) in step with the
//! source and removes the copy when the source disappears or stops being
//! eligible.
//!
//! The crate splits into a small pure projection ([`projection`]), the
//! level-triggered reconciliation core ([`reconciler`]), the pluggable
//! eligibility capability ([`policy`]), and the ambient pieces that wire a
//! controller process together ([`watch`], [`metrics`], [`server`],
//! [`config`]).

pub mod backoff;
pub mod config;
pub mod constants;
pub mod metrics;
pub mod policy;
pub mod projection;
pub mod reconciler;
pub mod server;
pub mod watch;

pub use config::ControllerConfig;
pub use policy::{LabelGatedEligibility, SyncEligibility};
pub use projection::SourceRef;
pub use reconciler::{EnsureOutcome, EnsurePlan, Reconciler, ReconcilerError};
