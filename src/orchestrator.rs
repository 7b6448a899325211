//! The orchestration core: walks the dependency-ordered component registry,
//! evaluates enablement, invokes installers, and aggregates outcomes.
//!
//! Failure policy: a fatal component failure halts the walk immediately;
//! nothing already installed is rolled back. Provisioning is additive and a
//! re-run is expected to skip or no-op satisfied steps. A degraded failure is
//! logged and the walk continues.

use std::collections::HashSet;

use log::{error, info, warn};

use crate::components::InstallContext;
use crate::config::Role;
use crate::error::ComponentError;
use crate::gateway::{ExecMode, Gateway};
use crate::registry::{self, ComponentDescriptor};
use crate::step;

/// Per-component result of one orchestration walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Succeeded,
    FailedFatal,
    FailedNonFatal,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Skipped => "skipped",
            Outcome::Succeeded => "ok",
            Outcome::FailedFatal => "FAILED",
            Outcome::FailedNonFatal => "degraded",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct ComponentReport {
    pub name: &'static str,
    pub outcome: Outcome,
    pub note: Option<String>,
}

/// Aggregate outcome of a run. Components after a fatal failure never ran
/// and have no entry.
#[derive(Debug, Default)]
pub struct RunReport {
    pub components: Vec<ComponentReport>,
}

impl RunReport {
    fn push(&mut self, name: &'static str, outcome: Outcome, note: Option<String>) {
        self.components.push(ComponentReport { name, outcome, note });
    }

    /// Every component Skipped or Succeeded.
    pub fn succeeded(&self) -> bool {
        self.components
            .iter()
            .all(|c| matches!(c.outcome, Outcome::Skipped | Outcome::Succeeded))
    }

    /// Name of the fatally failed component, if any. Drives the exit code:
    /// degraded components still yield a zero exit.
    pub fn fatal(&self) -> Option<&'static str> {
        self.components
            .iter()
            .find(|c| c.outcome == Outcome::FailedFatal)
            .map(|c| c.name)
    }
}

/// Walk the role's full registry.
pub fn run(ctx: &InstallContext) -> RunReport {
    let components = registry::registry(ctx.cfg.role);
    debug_assert!(
        registry::verify_order(components).is_ok(),
        "registry violates declared dependency order"
    );
    run_components(ctx, components)
}

/// Walk the registry restricted to an explicit subset of component names.
pub fn run_selected(ctx: &InstallContext, names: &[&str]) -> RunReport {
    for name in names {
        if !registry::registry(ctx.cfg.role).iter().any(|c| c.name == *name) {
            warn!("unknown component '{name}' ignored");
        }
    }
    let selected: Vec<ComponentDescriptor> = registry::registry(ctx.cfg.role)
        .iter()
        .filter(|c| names.contains(&c.name))
        .copied()
        .collect();
    run_components(ctx, &selected)
}

/// Core walk over an explicit descriptor list. Selections and test lists may
/// omit a dependency; the walk then downgrades the dependent to a skip.
pub fn run_components(ctx: &InstallContext, components: &[ComponentDescriptor]) -> RunReport {
    let mut report = RunReport::default();
    let mut completed: HashSet<&str> = HashSet::new();

    for c in components {
        let enabled = c.flag.map_or(true, |f| f(ctx.cfg));
        if !enabled {
            info!("component {} disabled, skipping", c.name);
            report.push(c.name, Outcome::Skipped, None);
            continue;
        }
        if let Some(dep) = c.deps.iter().find(|d| !completed.contains(**d)) {
            warn!(
                "component {} skipped: dependency '{dep}' did not complete",
                c.name
            );
            report.push(
                c.name,
                Outcome::Skipped,
                Some(format!("dependency '{dep}' did not complete")),
            );
            continue;
        }

        step!("component {}: starting", c.name);
        match (c.install)(ctx) {
            Ok(()) => {
                completed.insert(c.name);
                report.push(c.name, Outcome::Succeeded, None);
            }
            Err(ComponentError::Degraded(msg)) => {
                warn!("component {} degraded: {msg}", c.name);
                // Degraded still counts as completed for dependents.
                completed.insert(c.name);
                report.push(c.name, Outcome::FailedNonFatal, Some(msg));
            }
            Err(ComponentError::Fatal(e)) => {
                error!("component {} failed: {e:#}", c.name);
                report.push(c.name, Outcome::FailedFatal, Some(format!("{e:#}")));
                break;
            }
        }
    }
    report
}

/// Human-readable end-of-run summary: per-component outcome, effective
/// endpoints, and the seeded-credential reminder.
pub fn print_summary(ctx: &InstallContext, report: &RunReport) {
    println!();
    println!("==== socforge run summary ====");
    for c in &report.components {
        match &c.note {
            Some(note) => println!("  {:<20} {} ({note})", c.name, c.outcome),
            None => println!("  {:<20} {}", c.name, c.outcome),
        }
    }
    if let Some(name) = report.fatal() {
        println!();
        println!(
            "Run aborted at component '{name}'. Completed components were left in \
             place; fix the cause and re-run (the run is idempotent)."
        );
        return;
    }

    let endpoints: Vec<(&str, String)> = registry::registry(ctx.cfg.role)
        .iter()
        .filter(|d| {
            report.components.iter().any(|c| {
                c.name == d.name
                    && matches!(c.outcome, Outcome::Succeeded | Outcome::FailedNonFatal)
            })
        })
        .filter_map(|d| d.endpoint.map(|f| (d.name, f(ctx.cfg))))
        .collect();
    if !endpoints.is_empty() {
        println!();
        println!("Access endpoints:");
        for (name, endpoint) in endpoints {
            println!("  {name:<20} {endpoint}");
        }
    }

    if ctx.cfg.role == Role::Server && ctx.cfg.install_monitoring {
        println!();
        println!(
            "Reminder: the monitoring database user was seeded with a derived \
             credential; rotate it before exposing this host."
        );
    }
}

/// Print the recorded action plan of a dry run.
pub fn print_plan(gw: &Gateway) {
    debug_assert_eq!(gw.mode(), ExecMode::Simulate);
    let actions = gw.actions();
    println!();
    println!("Planned actions (dry run, nothing was changed):");
    if actions.is_empty() {
        println!("  (none)");
    }
    for (i, action) in actions.iter().enumerate() {
        println!("  {:>3}. {action}", i + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::platform::{OsFamily, Platform};
    use crate::registry::registry;

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

    fn platform() -> Platform {
        Platform {
            distro_id: "ubuntu".into(),
            family: OsFamily::DebianLike,
        }
    }

    fn ctx<'a>(cfg: &'a EnvConfig, platform: &'a Platform, gw: &'a Gateway) -> InstallContext<'a> {
        InstallContext { cfg, platform, gw }
    }

    // Fake components for trace tests. Each records one exec action named
    // after itself.
    fn install_a(ctx: &InstallContext) -> Result<(), ComponentError> {
        ctx.gw.run("install", &["a"])?;
        Ok(())
    }
    fn install_b_fatal(ctx: &InstallContext) -> Result<(), ComponentError> {
        ctx.gw.run("install", &["b"])?;
        Err(ComponentError::Fatal(anyhow::anyhow!("unrecoverable")))
    }
    fn install_b_degraded(ctx: &InstallContext) -> Result<(), ComponentError> {
        ctx.gw.run("install", &["b"])?;
        Err(ComponentError::Degraded("definitions unavailable".into()))
    }
    fn install_c(ctx: &InstallContext) -> Result<(), ComponentError> {
        ctx.gw.run("install", &["c"])?;
        Ok(())
    }

    fn descriptor(name: &'static str, install: fn(&InstallContext) -> Result<(), ComponentError>) -> ComponentDescriptor {
        ComponentDescriptor {
            name,
            flag: None,
            deps: &[],
            install,
            remove: install,
            data_paths: &[],
            endpoint: None,
        }
    }

    #[test]
    fn halt_on_fatal_stops_the_walk() {
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);
        let comps = [
            descriptor("a", install_a),
            descriptor("b", install_b_fatal),
            descriptor("c", install_c),
        ];

        let report = run_components(&ctx(&cfg, &platform, &gw), &comps);

        let outcomes: Vec<_> = report.components.iter().map(|c| (c.name, c.outcome)).collect();
        assert_eq!(
            outcomes,
            [("a", Outcome::Succeeded), ("b", Outcome::FailedFatal)]
        );
        assert_eq!(report.fatal(), Some("b"));
        assert!(!report.succeeded());
        // c was never attempted.
        let trace: Vec<_> = gw.actions().iter().map(|a| a.args[1].clone()).collect();
        assert_eq!(trace, ["a", "b"]);
    }

    #[test]
    fn degraded_failure_does_not_block_later_components() {
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);
        let comps = [
            descriptor("a", install_a),
            descriptor("b", install_b_degraded),
            descriptor("c", install_c),
        ];

        let report = run_components(&ctx(&cfg, &platform, &gw), &comps);

        assert_eq!(report.components.len(), 3);
        assert_eq!(report.components[1].outcome, Outcome::FailedNonFatal);
        assert_eq!(report.components[2].outcome, Outcome::Succeeded);
        assert!(report.fatal().is_none());
        assert!(!report.succeeded()); // degraded is not a clean success
    }

    #[test]
    fn disabled_component_is_skipped_without_invocation() {
        fn never(_: &EnvConfig) -> bool {
            false
        }
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);
        let mut b = descriptor("b", install_a);
        b.flag = Some(never);
        let comps = [b, descriptor("c", install_c)];

        let report = run_components(&ctx(&cfg, &platform, &gw), &comps);

        assert_eq!(report.components[0].outcome, Outcome::Skipped);
        assert!(report.succeeded());
        let trace: Vec<_> = gw.actions().iter().map(|a| a.args[1].clone()).collect();
        assert_eq!(trace, ["c"]);
    }

    #[test]
    fn dry_run_over_full_server_registry_is_ordered_and_non_mutating() {
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);

        let report = run(&ctx(&cfg, &platform, &gw));

        assert!(report.fatal().is_none());
        assert!(report.succeeded());
        assert_eq!(report.components.len(), registry(Role::Server).len());

        let actions = gw.actions();
        assert!(!actions.is_empty());
        // The mandatory database component runs first: its package index
        // refresh and MariaDB install lead the plan.
        assert!(actions[0].args.iter().any(|a| a == "update"));
        assert!(actions[1].args.iter().any(|a| a == "mariadb-server"));
        // Credentials ride in stdin or redacted environment, never argv.
        assert!(
            actions
                .iter()
                .all(|a| a.args.iter().all(|s| !s.contains("s3cret")))
        );
    }

    #[test]
    fn dry_run_is_deterministic() {
        let cfg = server_cfg();
        let platform = platform();

        let gw1 = Gateway::new(ExecMode::Simulate);
        run(&ctx(&cfg, &platform, &gw1));
        let gw2 = Gateway::new(ExecMode::Simulate);
        run(&ctx(&cfg, &platform, &gw2));

        assert_eq!(gw1.actions(), gw2.actions());
    }

    #[test]
    fn mandatory_component_precedes_optional_ones_in_the_trace() {
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);

        run(&ctx(&cfg, &platform, &gw));

        let actions = gw.actions();
        let first_mariadb = actions
            .iter()
            .position(|a| a.args.iter().any(|s| s.contains("mariadb-server")))
            .unwrap();
        let first_optional = actions
            .iter()
            .position(|a| a.args.iter().any(|s| s.contains("wazuh") || s.contains("zabbix")))
            .unwrap();
        assert!(first_mariadb < first_optional);
    }

    #[test]
    fn run_selected_restricts_the_walk() {
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);

        let report = run_selected(&ctx(&cfg, &platform, &gw), &["proxy"]);

        assert_eq!(report.components.len(), 1);
        assert_eq!(report.components[0].name, "proxy");
        assert!(gw.actions().iter().any(|a| a.args.iter().any(|s| s == "nginx")));
        assert!(!gw.actions().iter().any(|a| a.args.iter().any(|s| s.contains("mariadb"))));
    }

    #[test]
    fn unmet_dependency_downgrades_to_skip() {
        let cfg = server_cfg();
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);
        // run_selected drops the database, leaving monitoring-server's
        // dependency unmet.
        let report = run_selected(&ctx(&cfg, &platform, &gw), &["monitoring-server"]);

        assert_eq!(report.components[0].outcome, Outcome::Skipped);
        assert!(report.components[0].note.as_deref().unwrap().contains("database"));
    }

    #[test]
    fn all_disabled_run_succeeds_with_skips() {
        let mut cfg = server_cfg();
        cfg.install_siem = false;
        cfg.install_monitoring = false;
        cfg.install_proxy = false;
        cfg.install_antivirus = false;
        let platform = platform();
        let gw = Gateway::new(ExecMode::Simulate);

        let report = run(&ctx(&cfg, &platform, &gw));

        assert!(report.succeeded());
        // Only the mandatory database actually ran.
        let ran: Vec<_> = report
            .components
            .iter()
            .filter(|c| c.outcome == Outcome::Succeeded)
            .map(|c| c.name)
            .collect();
        assert_eq!(ran, ["database"]);
    }
}
