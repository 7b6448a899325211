//! Error taxonomy for the provisioning run.
//!
//! Fatal errors abort before (or during) the component walk; degraded errors
//! are surfaced as warnings and never halt the run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;

/// Fatal precondition failures checked before any component runs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("root privileges are required for a live run (re-run with sudo, or use --dry-run)")]
    PrivilegeRequired,
}

/// Failure modes of a single component installer or remover.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Unrecoverable failure. Halts the remaining install walk.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),

    /// Best-effort sub-step failed. Logged as a warning, run continues.
    #[error("{0}")]
    Degraded(String),
}
