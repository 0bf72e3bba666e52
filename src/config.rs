//! # Configuration
//!
//! Process-wide configuration, parsed once at startup and read-only
//! afterwards. Every value can be supplied as a command-line flag or an
//! environment variable.

use clap::Parser;

use crate::constants;

/// Runtime configuration for the controller process.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "secret-sync-controller",
    about = "Mirrors eligible Kubernetes Secrets into a central sync namespace",
    version
)]
pub struct ControllerConfig {
    /// Namespace that receives the synced secret copies
    #[arg(
        long,
        env = "SECRETS_NAMESPACE",
        default_value = constants::DEFAULT_SECRETS_NAMESPACE
    )]
    pub secrets_namespace: String,

    /// Port for the metrics and probe HTTP server
    #[arg(long, env = "METRICS_PORT", default_value_t = constants::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}
