//! Product-specific component installers.
//!
//! Each module exposes an `install`/`remove` pair taking the run context.
//! All branching is on the OS family, all mutation goes through the gateway,
//! and every step probes current state first so re-runs are no-ops.

pub mod antivirus;
pub mod database;
pub mod monitoring_agent;
pub mod monitoring_server;
pub mod proxy;
pub mod siem_agent;
pub mod siem_manager;

use crate::config::EnvConfig;
use crate::gateway::Gateway;
use crate::platform::Platform;

/// Immutable context handed to every component entrypoint. Components never
/// read ambient global state; everything they may consult is here.
pub struct InstallContext<'a> {
    pub cfg: &'a EnvConfig,
    pub platform: &'a Platform,
    pub gw: &'a Gateway,
}

/// Credential seeded for the monitoring database user. Derived, not secret;
/// the end-of-run summary reminds the operator to rotate it.
pub(crate) fn monitoring_db_password(cfg: &EnvConfig) -> String {
    format!("{}-zabbix-db", cfg.site_id)
}

/// Quote a string as a SQL literal. Backslashes and quotes are escaped so a
/// credential containing either cannot break out of the statement.
pub(crate) fn sql_literal(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_literal_escapes_quotes_and_backslashes() {
        assert_eq!(sql_literal("plain"), "'plain'");
        assert_eq!(sql_literal("s3c'ret"), "'s3c\\'ret'");
        assert_eq!(sql_literal(r"a\b"), r"'a\\b'");
    }
}
