//! nginx reverse proxy publishing the monitoring web frontend, expected on
//! local port 8080, on port 80.

use std::path::Path;

use super::InstallContext;
use crate::conf_file;
use crate::error::ComponentError;
use crate::pkg::PkgProvider;
use crate::platform::OsFamily;
use crate::service;
use crate::step;

pub const SERVICE: &str = "nginx";
const PACKAGES: &[&str] = &["nginx"];
const SITE_CONF: &str = "/etc/nginx/conf.d/socforge.conf";
const DEBIAN_DEFAULT_SITE: &str = "/etc/nginx/sites-enabled/default";

fn site_config(hostname: &str) -> String {
    format!(
        "server {{\n\
         \x20   listen 80;\n\
         \x20   server_name {hostname};\n\
         \n\
         \x20   location / {{\n\
         \x20       proxy_pass http://127.0.0.1:8080/;\n\
         \x20       proxy_set_header Host $host;\n\
         \x20       proxy_set_header X-Real-IP $remote_addr;\n\
         \x20   }}\n\
         }}\n"
    )
}

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;

    step!("proxy: installing nginx");
    PkgProvider::new(gw, ctx.platform.family).install(PACKAGES)?;

    step!("proxy: writing reverse-proxy site");
    conf_file::write_if_changed(
        gw,
        Path::new(SITE_CONF),
        &site_config(&ctx.cfg.server_hostname),
    )?;
    if ctx.platform.family == OsFamily::DebianLike {
        let default_site = Path::new(DEBIAN_DEFAULT_SITE);
        if gw.file_exists(default_site) {
            gw.remove_file(default_site)?;
        }
    }

    service::enable(gw, SERVICE)?;
    service::restart(gw, SERVICE)?;
    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    step!("proxy: removing nginx");
    service::stop(gw, SERVICE)?;
    if gw.has_service(SERVICE) {
        service::disable(gw, SERVICE)?;
    }
    PkgProvider::new(gw, ctx.platform.family).remove(PACKAGES)?;
    let site = Path::new(SITE_CONF);
    if gw.file_exists(site) {
        gw.remove_file(site)?;
    }
    Ok(())
}

/// Effective access endpoint, used by the run summary.
pub fn endpoint(hostname: &str) -> String {
    format!("http://{hostname}/")
}
