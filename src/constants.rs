//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Label on a synced copy naming the namespace of its source Secret
pub const OWNING_SECRET_NAMESPACE_LABEL: &str = "secret-sync.microscaler.io/owning-secret-namespace";

/// Label on a synced copy naming its source Secret
pub const OWNING_SECRET_NAME_LABEL: &str = "secret-sync.microscaler.io/owning-secret-name";

/// Opt-in label that marks a source Secret as eligible for syncing
pub const SYNC_GATE_LABEL: &str = "secret-sync.microscaler.io/sync";

/// Value the opt-in label must carry for the default eligibility policy
pub const SYNC_GATE_ENABLED: &str = "true";

/// Default namespace that receives synced copies
pub const DEFAULT_SECRETS_NAMESPACE: &str = "microscaler-secrets";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Maximum reconcile attempts per watch event before giving up until the
/// next event or relist
pub const MAX_RECONCILE_ATTEMPTS: u32 = 5;

/// Starting value of the retry backoff sequence (seconds)
pub const RETRY_BACKOFF_MIN_SECS: u64 = 1;

/// Cap of the retry backoff sequence (seconds)
pub const RETRY_BACKOFF_MAX_SECS: u64 = 30;

/// Delay before restarting the secret watch stream after it ends (seconds)
pub const WATCH_RESTART_DELAY_SECS: u64 = 5;
