//! Wazuh agent for client hosts: enrolls against the manager address from
//! the environment configuration.

use std::path::Path;

use super::InstallContext;
use crate::error::ComponentError;
use crate::pkg::PkgProvider;
use crate::service;
use crate::step;

pub const SERVICE: &str = "wazuh-agent";
const PACKAGES: &[&str] = &["wazuh-agent"];
const OSSEC_CONF: &str = "/var/ossec/etc/ossec.conf";

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    let manager = ctx.cfg.manager_addr.as_deref().unwrap_or_default();

    step!("siem-agent: configuring vendor repository");
    super::siem_manager::configure_repo(gw, ctx.platform.family)?;

    step!("siem-agent: installing Wazuh agent");
    // The package's postinst seeds the manager address from this variable.
    PkgProvider::new(gw, ctx.platform.family)
        .install_env(PACKAGES, &[("WAZUH_MANAGER", manager)])?;

    // Re-point an existing install whose config predates this run.
    let conf = Path::new(OSSEC_CONF);
    if gw.file_exists(conf) {
        let expr = format!("s|<address>.*</address>|<address>{manager}</address>|");
        gw.run("sed", &["-i", &expr, OSSEC_CONF])?;
    }

    service::daemon_reload(gw)?;
    service::enable_and_start(gw, SERVICE)?;
    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    step!("siem-agent: removing Wazuh agent");
    service::stop(gw, SERVICE)?;
    if gw.has_service(SERVICE) {
        service::disable(gw, SERVICE)?;
    }
    PkgProvider::new(gw, ctx.platform.family).remove(PACKAGES)?;
    // The agent introduced the vendor repo on this host; take it back out.
    super::siem_manager::remove_repo(gw)?;
    Ok(())
}
