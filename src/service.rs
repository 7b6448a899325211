//! Systemd service operations routed through the gateway.
//!
//! Start and stop probe current state first, so repeated runs are no-ops.

use anyhow::Result;
use log::debug;

use crate::gateway::Gateway;

pub fn enable(gw: &Gateway, name: &str) -> Result<()> {
    gw.run("systemctl", &["enable", name])
}

pub fn disable(gw: &Gateway, name: &str) -> Result<()> {
    gw.run("systemctl", &["disable", name])
}

pub fn start(gw: &Gateway, name: &str) -> Result<()> {
    if gw.service_active(name) {
        debug!("service {name} already running");
        return Ok(());
    }
    gw.run("systemctl", &["start", name])
}

pub fn stop(gw: &Gateway, name: &str) -> Result<()> {
    if !gw.service_active(name) {
        debug!("service {name} not running");
        return Ok(());
    }
    gw.run("systemctl", &["stop", name])
}

pub fn restart(gw: &Gateway, name: &str) -> Result<()> {
    gw.run("systemctl", &["restart", name])
}

pub fn daemon_reload(gw: &Gateway) -> Result<()> {
    gw.run("systemctl", &["daemon-reload"])
}

/// Enable and start in one step; the usual tail of a component install.
pub fn enable_and_start(gw: &Gateway, name: &str) -> Result<()> {
    enable(gw, name)?;
    start(gw, name)
}
