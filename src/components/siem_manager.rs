//! Wazuh manager: the SIEM side of the stack.

use std::path::Path;

use super::InstallContext;
use crate::conf_file;
use crate::error::ComponentError;
use crate::gateway::Gateway;
use crate::pkg::PkgProvider;
use crate::platform::OsFamily;
use crate::service;
use crate::step;

pub const SERVICE: &str = "wazuh-manager";
const PACKAGES: &[&str] = &["wazuh-manager"];

const APT_KEYRING: &str = "/usr/share/keyrings/wazuh.gpg";
const APT_SOURCE: &str = "/etc/apt/sources.list.d/wazuh.list";
const APT_SOURCE_LINE: &str =
    "deb [signed-by=/usr/share/keyrings/wazuh.gpg] https://packages.wazuh.com/4.x/apt/ stable main\n";

const YUM_REPO: &str = "/etc/yum.repos.d/wazuh.repo";
const REPO_FILES: &[&str] = &[APT_SOURCE, YUM_REPO];
const YUM_REPO_BODY: &str = "\
[wazuh]
name=Wazuh repository
baseurl=https://packages.wazuh.com/4.x/yum/
gpgcheck=1
gpgkey=https://packages.wazuh.com/key/GPG-KEY-WAZUH
enabled=1
";

/// Configure the vendor package repository. Shared with the agent installer.
pub(crate) fn configure_repo(gw: &Gateway, family: OsFamily) -> anyhow::Result<()> {
    match family {
        OsFamily::DebianLike => {
            if !gw.file_exists(Path::new(APT_KEYRING)) {
                gw.run(
                    "sh",
                    &[
                        "-c",
                        "curl -fsSL https://packages.wazuh.com/key/GPG-KEY-WAZUH \
                         | gpg --dearmor -o /usr/share/keyrings/wazuh.gpg",
                    ],
                )?;
            }
            conf_file::write_if_changed(gw, Path::new(APT_SOURCE), APT_SOURCE_LINE)?;
        }
        OsFamily::RhelLike => {
            conf_file::write_if_changed(gw, Path::new(YUM_REPO), YUM_REPO_BODY)?;
        }
    }
    Ok(())
}

/// Delete the vendor repository files introduced by [`configure_repo`].
/// Shared with the agent installer's teardown.
pub(crate) fn remove_repo(gw: &Gateway) -> anyhow::Result<()> {
    remove_repo_files(gw, REPO_FILES)
}

fn remove_repo_files(gw: &Gateway, files: &[&str]) -> anyhow::Result<()> {
    for file in files {
        let path = Path::new(file);
        if gw.file_exists(path) {
            gw.remove_file(path)?;
        }
    }
    Ok(())
}

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;

    step!("siem-manager: configuring vendor repository");
    configure_repo(gw, ctx.platform.family)?;

    step!("siem-manager: installing Wazuh manager");
    PkgProvider::new(gw, ctx.platform.family).install(PACKAGES)?;
    service::daemon_reload(gw)?;
    service::enable_and_start(gw, SERVICE)?;
    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    step!("siem-manager: removing Wazuh manager");
    service::stop(gw, SERVICE)?;
    if gw.has_service(SERVICE) {
        service::disable(gw, SERVICE)?;
    }
    PkgProvider::new(gw, ctx.platform.family).remove(PACKAGES)?;
    remove_repo(gw)?;
    Ok(())
}
