//! Privilege checks for live runs.

use nix::unistd::geteuid;

use crate::error::SetupError;
use crate::gateway::ExecMode;

/// Require root for a live run. Simulation never mutates the system, so a
/// dry run is allowed (and useful) as an unprivileged user.
pub fn require_root(mode: ExecMode) -> Result<(), SetupError> {
    if mode == ExecMode::Live && !geteuid().is_root() {
        return Err(SetupError::PrivilegeRequired);
    }
    Ok(())
}
