//! ClamAV: installed on both roles when enabled. The definition refresh is
//! best-effort; a host without repository access still gets a working daemon
//! and the run records a degraded outcome instead of failing.

use log::warn;

use super::InstallContext;
use crate::error::ComponentError;
use crate::pkg::PkgProvider;
use crate::platform::OsFamily;
use crate::service;
use crate::step;

fn packages(family: OsFamily) -> &'static [&'static str] {
    match family {
        OsFamily::DebianLike => &["clamav-daemon", "clamav-freshclam"],
        OsFamily::RhelLike => &["clamd", "clamav-update"],
    }
}

pub fn daemon_service(family: OsFamily) -> &'static str {
    match family {
        OsFamily::DebianLike => "clamav-daemon",
        OsFamily::RhelLike => "clamd@scan",
    }
}

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    let family = ctx.platform.family;

    step!("antivirus: installing ClamAV");
    PkgProvider::new(gw, family).install(packages(family))?;

    // Definition refresh needs the vendor mirror; never fatal.
    step!("antivirus: refreshing virus definitions");
    let refresh = gw.run("freshclam", &[]);

    service::enable_and_start(gw, daemon_service(family))?;

    if let Err(e) = refresh {
        warn!("antivirus: definition refresh failed, continuing with shipped definitions: {e:#}");
        return Err(ComponentError::Degraded(format!(
            "virus definition refresh failed: {e}"
        )));
    }
    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    let family = ctx.platform.family;
    step!("antivirus: removing ClamAV");
    let daemon = daemon_service(family);
    service::stop(gw, daemon)?;
    if gw.has_service(daemon) {
        service::disable(gw, daemon)?;
    }
    PkgProvider::new(gw, family).remove(packages(family))?;
    Ok(())
}
