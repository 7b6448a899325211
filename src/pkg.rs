//! Package provider: apt/dnf invocations routed through the gateway.
//!
//! Install and remove are idempotent; already-satisfied requests are no-ops.
//! The package index is refreshed once per run, before the first install.

use anyhow::{Context, Result};
use log::debug;

use crate::gateway::{ExecMode, Gateway};
use crate::platform::OsFamily;

pub struct PkgProvider<'a> {
    gw: &'a Gateway,
    family: OsFamily,
}

impl<'a> PkgProvider<'a> {
    pub fn new(gw: &'a Gateway, family: OsFamily) -> Self {
        PkgProvider { gw, family }
    }

    fn manager(&self) -> &'static str {
        match self.family {
            OsFamily::DebianLike => "apt-get",
            OsFamily::RhelLike => "dnf",
        }
    }

    /// Fail early with a clear message when the package manager itself is
    /// missing. Skipped in simulate mode: the preview host may not be the
    /// target host.
    fn require_manager(&self) -> Result<()> {
        if self.gw.mode() == ExecMode::Simulate {
            return Ok(());
        }
        which::which(self.manager())
            .map(|_| ())
            .with_context(|| format!("package manager '{}' not found on this host", self.manager()))
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.gw.has_package(self.family, name)
    }

    /// Install the subset of `packages` not already present.
    pub fn install(&self, packages: &[&str]) -> Result<()> {
        self.install_env(packages, &[])
    }

    /// Install with extra environment variables (some vendor packages read
    /// configuration from the install environment).
    pub fn install_env(&self, packages: &[&str], envs: &[(&str, &str)]) -> Result<()> {
        let missing: Vec<&str> = packages
            .iter()
            .copied()
            .filter(|p| !self.is_installed(p))
            .collect();
        if missing.is_empty() {
            debug!("packages already installed: {}", packages.join(", "));
            return Ok(());
        }
        self.require_manager()?;
        self.refresh_index_once()?;

        let mut args = vec!["install", "-y"];
        args.extend(&missing);
        match self.family {
            OsFamily::DebianLike => {
                let mut env = vec![("DEBIAN_FRONTEND", "noninteractive")];
                env.extend_from_slice(envs);
                self.gw.run_env("apt-get", &args, &env)
            }
            OsFamily::RhelLike => self.gw.run_env("dnf", &args, envs),
        }
    }

    /// Remove the subset of `packages` that is actually installed.
    pub fn remove(&self, packages: &[&str]) -> Result<()> {
        let present: Vec<&str> = packages
            .iter()
            .copied()
            .filter(|p| self.is_installed(p))
            .collect();
        if present.is_empty() {
            debug!("packages already absent: {}", packages.join(", "));
            return Ok(());
        }
        self.require_manager()?;

        let mut args = match self.family {
            OsFamily::DebianLike => vec!["purge", "-y"],
            OsFamily::RhelLike => vec!["remove", "-y"],
        };
        args.extend(&present);
        match self.family {
            OsFamily::DebianLike => {
                self.gw
                    .run_env("apt-get", &args, &[("DEBIAN_FRONTEND", "noninteractive")])
            }
            OsFamily::RhelLike => self.gw.run("dnf", &args),
        }
    }

    fn refresh_index_once(&self) -> Result<()> {
        if !self.gw.claim_pkg_index_refresh() {
            return Ok(());
        }
        match self.family {
            OsFamily::DebianLike => self.gw.run_env(
                "apt-get",
                &["update"],
                &[("DEBIAN_FRONTEND", "noninteractive")],
            ),
            OsFamily::RhelLike => self.gw.run("dnf", &["makecache", "--refresh"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_install_records_refresh_then_install() {
        let gw = Gateway::new(ExecMode::Simulate);
        let pkg = PkgProvider::new(&gw, OsFamily::DebianLike);
        pkg.install(&["nginx"]).unwrap();

        let actions = gw.actions();
        assert_eq!(actions.len(), 2);
        assert!(actions[0].args.contains(&"update".to_string()));
        assert!(actions[1].args.contains(&"nginx".to_string()));
        assert!(
            actions[1]
                .args
                .contains(&"DEBIAN_FRONTEND=noninteractive".to_string())
        );
    }

    #[test]
    fn index_refresh_happens_once_per_run() {
        let gw = Gateway::new(ExecMode::Simulate);
        let pkg = PkgProvider::new(&gw, OsFamily::RhelLike);
        pkg.install(&["nginx"]).unwrap();
        pkg.install(&["mariadb-server"]).unwrap();

        let refreshes = gw
            .actions()
            .iter()
            .filter(|a| a.args.contains(&"makecache".to_string()))
            .count();
        assert_eq!(refreshes, 1);
    }

    #[test]
    fn simulate_remove_is_a_noop_on_a_fresh_host() {
        // Simulate probes report packages absent, so removal records nothing.
        let gw = Gateway::new(ExecMode::Simulate);
        let pkg = PkgProvider::new(&gw, OsFamily::DebianLike);
        pkg.remove(&["nginx"]).unwrap();
        assert!(gw.actions().is_empty());
    }

    #[test]
    fn family_selects_package_manager() {
        let gw = Gateway::new(ExecMode::Simulate);
        let pkg = PkgProvider::new(&gw, OsFamily::RhelLike);
        pkg.install(&["clamd"]).unwrap();
        assert!(gw.actions().iter().all(|a| a.args.contains(&"dnf".to_string())));
    }
}
