//! Zabbix agent for client hosts.

use std::path::Path;

use super::InstallContext;
use crate::conf_file;
use crate::error::ComponentError;
use crate::pkg::PkgProvider;
use crate::service;
use crate::step;

pub const SERVICE: &str = "zabbix-agent";
const PACKAGES: &[&str] = &["zabbix-agent"];
const AGENT_CONF: &str = "/etc/zabbix/zabbix_agentd.conf";

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    let manager = ctx.cfg.manager_addr.as_deref().unwrap_or_default();

    step!("monitoring-agent: installing Zabbix agent");
    PkgProvider::new(gw, ctx.platform.family).install(PACKAGES)?;

    step!("monitoring-agent: writing agent configuration");
    conf_file::apply_directives(
        gw,
        Path::new(AGENT_CONF),
        '=',
        &[
            ("Server", manager),
            ("ServerActive", manager),
            ("Hostname", ctx.cfg.site_id.as_str()),
        ],
        true,
    )?;

    service::enable_and_start(gw, SERVICE)?;
    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    step!("monitoring-agent: removing Zabbix agent");
    service::stop(gw, SERVICE)?;
    if gw.has_service(SERVICE) {
        service::disable(gw, SERVICE)?;
    }
    PkgProvider::new(gw, ctx.platform.family).remove(PACKAGES)?;
    let conf = Path::new(AGENT_CONF);
    if gw.file_exists(conf) {
        gw.remove_file(conf)?;
    }
    Ok(())
}
