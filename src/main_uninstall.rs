//! socforge-uninstall: selective teardown of provisioned components.

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use socforge::cli::UninstallArgs;
use socforge::components::InstallContext;
use socforge::config::EnvConfig;
use socforge::gateway::{ExecMode, Gateway};
use socforge::platform::Platform;
use socforge::{logging, orchestrator, privilege, uninstall};

fn main() {
    let args = UninstallArgs::parse();
    let mode = if args.dry_run {
        ExecMode::Simulate
    } else {
        ExecMode::Live
    };

    if let Err(e) = logging::init(args.verbose, mode) {
        eprintln!("failed to initialize logging: {e:#}");
        std::process::exit(1);
    }
    if let Err(e) = real_main(&args, mode) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn real_main(args: &UninstallArgs, mode: ExecMode) -> Result<()> {
    // Same precondition order as the installer.
    let cfg = EnvConfig::load(&args.env)?;
    let platform = Platform::detect()?;
    privilege::require_root(mode)?;

    let selection = args.selection();
    info!(
        "removing {:?} from {:?} role host{}",
        selection,
        cfg.role,
        if mode == ExecMode::Simulate { " [dry run]" } else { "" }
    );

    let gw = Gateway::new(mode);
    let ctx = InstallContext {
        cfg: &cfg,
        platform: &platform,
        gw: &gw,
    };

    let report = uninstall::remove(&ctx, &selection);
    uninstall::print_summary(&report);
    if mode == ExecMode::Simulate {
        orchestrator::print_plan(&gw);
    }

    match report.fatal() {
        Some(name) => anyhow::bail!("removal failed at component '{name}'"),
        None => Ok(()),
    }
}
