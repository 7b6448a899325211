//! Command-line surfaces for the install and uninstall binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_ENV_PATH;
use crate::uninstall::Selection;

#[derive(Parser, Debug)]
#[command(
    name = "socforge-install",
    version,
    about = "Provision the security-operations stack on this host"
)]
pub struct InstallArgs {
    /// Show what would be done without doing it
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Enable detailed per-action logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Override the environment file path
    #[arg(short = 'e', long = "env", value_name = "FILE", default_value = DEFAULT_ENV_PATH)]
    pub env: PathBuf,
}

#[derive(Parser, Debug)]
#[command(
    name = "socforge-uninstall",
    version,
    about = "Remove stack components installed by socforge-install"
)]
pub struct UninstallArgs {
    /// Show what would be done without doing it
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Enable detailed per-action logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Override the environment file path
    #[arg(short = 'e', long = "env", value_name = "FILE", default_value = DEFAULT_ENV_PATH)]
    pub env: PathBuf,

    /// Remove every component (the default when no component flag is given)
    #[arg(long, conflicts_with_all = [
        "database", "siem_manager", "monitoring_server", "proxy",
        "antivirus", "siem_agent", "monitoring_agent",
    ])]
    pub all: bool,

    /// Remove only the database
    #[arg(long)]
    pub database: bool,

    /// Remove only the SIEM manager
    #[arg(long)]
    pub siem_manager: bool,

    /// Remove only the monitoring server
    #[arg(long)]
    pub monitoring_server: bool,

    /// Remove only the reverse proxy
    #[arg(long)]
    pub proxy: bool,

    /// Remove only the antivirus engine
    #[arg(long)]
    pub antivirus: bool,

    /// Remove only the SIEM agent
    #[arg(long)]
    pub siem_agent: bool,

    /// Remove only the monitoring agent
    #[arg(long)]
    pub monitoring_agent: bool,
}

impl UninstallArgs {
    /// Component flags narrow the default full teardown to the named subset.
    pub fn selection(&self) -> Selection {
        let flags = [
            (self.database, "database"),
            (self.siem_manager, "siem-manager"),
            (self.monitoring_server, "monitoring-server"),
            (self.proxy, "proxy"),
            (self.antivirus, "antivirus"),
            (self.siem_agent, "siem-agent"),
            (self.monitoring_agent, "monitoring-agent"),
        ];
        let names: Vec<String> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| name.to_string())
            .collect();
        if names.is_empty() {
            Selection::All
        } else {
            Selection::Only(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_flags_parse() {
        let args =
            InstallArgs::try_parse_from(["socforge-install", "-d", "-v", "-e", "/tmp/x.env"])
                .unwrap();
        assert!(args.dry_run);
        assert!(args.verbose);
        assert_eq!(args.env, PathBuf::from("/tmp/x.env"));
    }

    #[test]
    fn env_path_defaults() {
        let args = InstallArgs::try_parse_from(["socforge-install"]).unwrap();
        assert_eq!(args.env, PathBuf::from(DEFAULT_ENV_PATH));
    }

    #[test]
    fn uninstall_defaults_to_all() {
        let args = UninstallArgs::try_parse_from(["socforge-uninstall"]).unwrap();
        assert_eq!(args.selection(), Selection::All);
    }

    #[test]
    fn component_flags_narrow_the_selection() {
        let args =
            UninstallArgs::try_parse_from(["socforge-uninstall", "--proxy", "--antivirus"])
                .unwrap();
        assert_eq!(
            args.selection(),
            Selection::Only(vec!["proxy".into(), "antivirus".into()])
        );
    }

    #[test]
    fn all_conflicts_with_component_flags() {
        assert!(UninstallArgs::try_parse_from(["socforge-uninstall", "--all", "--proxy"]).is_err());
    }
}
