//! socforge-install: provision the security-operations stack on this host.

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use socforge::cli::InstallArgs;
use socforge::components::InstallContext;
use socforge::config::EnvConfig;
use socforge::gateway::{ExecMode, Gateway};
use socforge::platform::Platform;
use socforge::{logging, orchestrator, privilege};

fn main() {
    let args = InstallArgs::parse();
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

fn real_main(args: &InstallArgs, mode: ExecMode) -> Result<()> {
    // Stable precondition order: configuration, then platform, then
    // privilege. Nothing below mutates the system before all three pass.
    let cfg = EnvConfig::load(&args.env)?;
    let platform = Platform::detect()?;
    privilege::require_root(mode)?;

    info!(
        "provisioning {:?} role on '{}' ({:?} family){}",
        cfg.role,
        platform.distro_id,
        platform.family,
        if mode == ExecMode::Simulate { " [dry run]" } else { "" }
    );

    let gw = Gateway::new(mode);
    let ctx = InstallContext {
        cfg: &cfg,
        platform: &platform,
        gw: &gw,
    };

    let report = orchestrator::run(&ctx);
    orchestrator::print_summary(&ctx, &report);
    if mode == ExecMode::Simulate {
        orchestrator::print_plan(&gw);
    }

    match report.fatal() {
        Some(name) => anyhow::bail!("provisioning failed at component '{name}'"),
        None => Ok(()),
    }
}
