//! Selective teardown: walks the registry in reverse order, stopping
//! services, removing packages and component-owned configuration.
//!
//! Persisted data stores are never deleted here; each left-behind path is
//! named in a warning so their removal stays an explicit operator action.
//! Every step probes before acting, so uninstalling twice, or on a host where
//! a component never existed, is a pure no-op. Individual removal failures
//! are warned about and the walk continues; teardown always attempts every
//! targeted component.

use std::path::Path;

use log::warn;

use crate::components::InstallContext;
use crate::gateway::Gateway;
use crate::orchestrator::{ComponentReport, Outcome, RunReport};
use crate::registry::{self, ComponentDescriptor};
use crate::step;

/// What to tear down: everything, or an explicit subset of component names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(Vec<String>),
}

impl Selection {
    fn includes(&self, name: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Remove the selected components in reverse registry order.
pub fn remove(ctx: &InstallContext, selection: &Selection) -> RunReport {
    if let Selection::Only(names) = selection {
        for name in names {
            if !registry::registry(ctx.cfg.role).iter().any(|c| c.name == *name) {
                warn!("unknown component '{name}' ignored");
            }
        }
    }

    let targets: Vec<ComponentDescriptor> = registry::registry(ctx.cfg.role)
        .iter()
        .rev()
        .filter(|c| selection.includes(c.name))
        .copied()
        .collect();

    let mut report = RunReport::default();
    for c in &targets {
        step!("component {}: removing", c.name);
        match (c.remove)(ctx) {
            Ok(()) => {
                warn_left_behind_data(ctx.gw, c);
                report.components.push(ComponentReport {
                    name: c.name,
                    outcome: Outcome::Succeeded,
                    note: None,
                });
            }
            Err(e) => {
                warn!("removal of {} failed, continuing: {e:#}", c.name);
                report.components.push(ComponentReport {
                    name: c.name,
                    outcome: Outcome::FailedNonFatal,
                    note: Some(format!("{e:#}")),
                });
            }
        }
    }
    report
}

fn warn_left_behind_data(gw: &Gateway, c: &ComponentDescriptor) {
    for path in c.data_paths {
        if gw.file_exists(Path::new(path)) {
            warn!(
                "{}: persisted data left in place at {path}; remove it manually if that is intended",
                c.name
            );
        }
    }
}

/// End-of-teardown summary.
pub fn print_summary(report: &RunReport) {
    println!();
    println!("==== socforge removal summary ====");
    for c in &report.components {
        match &c.note {
            Some(note) => println!("  {:<20} {} ({note})", c.name, c.outcome),
            None => println!("  {:<20} {}", c.name, c.outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvConfig, Role};
    use crate::gateway::ExecMode;
    use crate::platform::{OsFamily, Platform};

    fn server_cfg() -> EnvConfig {
        EnvConfig {
            role: Role::Server,
            site_id: "lab-01".into(),
            server_hostname: "soc.example.org".into(),
            db_root_password: Some("s3cret".into()),
            manager_addr: None,
            install_siem: true,
            install_monitoring: true,
            install_proxy: true,
            install_antivirus: true,
            install_siem_agent: false,
            install_monitoring_agent: false,
        }
    }

    #[test]
    fn full_teardown_walks_reverse_registry_order() {
        let cfg = server_cfg();
        let platform = Platform {
            distro_id: "rocky".into(),
            family: OsFamily::RhelLike,
        };
        let gw = Gateway::new(ExecMode::Simulate);
        let ctx = InstallContext { cfg: &cfg, platform: &platform, gw: &gw };

        let report = remove(&ctx, &Selection::All);

        let names: Vec<_> = report.components.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            ["antivirus", "proxy", "monitoring-server", "siem-manager", "database"]
        );
        assert!(report.fatal().is_none());
    }

    #[test]
    fn selection_narrows_to_named_components() {
        let cfg = server_cfg();
        let platform = Platform {
            distro_id: "ubuntu".into(),
            family: OsFamily::DebianLike,
        };
        let gw = Gateway::new(ExecMode::Simulate);
        let ctx = InstallContext { cfg: &cfg, platform: &platform, gw: &gw };

        let report = remove(&ctx, &Selection::Only(vec!["proxy".into()]));

        assert_eq!(report.components.len(), 1);
        assert_eq!(report.components[0].name, "proxy");
    }

    #[test]
    fn teardown_on_a_clean_host_is_a_noop() {
        // Simulate probes report everything absent: no packages, no services,
        // no config files. The walk must produce zero actions and no errors.
        let cfg = server_cfg();
        let platform = Platform {
            distro_id: "debian".into(),
            family: OsFamily::DebianLike,
        };
        let gw = Gateway::new(ExecMode::Simulate);
        let ctx = InstallContext { cfg: &cfg, platform: &platform, gw: &gw };

        let report = remove(&ctx, &Selection::All);

        assert!(report.succeeded());
        assert!(gw.actions().is_empty());
    }
}
