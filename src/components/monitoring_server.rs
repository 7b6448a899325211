//! Zabbix server: the monitoring side of the stack. Depends on the database
//! component having created the `zabbix` schema and user.
//!
//! The web frontend is assumed to be served on local port 8080, where the
//! reverse-proxy component publishes it on port 80; wiring the frontend's
//! own vhost to that port is left to the operator (distribution packaging
//! differs too much to do it blindly).

use std::path::Path;

use super::{InstallContext, monitoring_db_password};
use crate::conf_file;
use crate::error::ComponentError;
use crate::pkg::PkgProvider;
use crate::platform::OsFamily;
use crate::service;
use crate::step;

pub const SERVICE: &str = "zabbix-server";
const CONF_DIR: &str = "/etc/zabbix";
const SERVER_CONF: &str = "/etc/zabbix/zabbix_server.conf";
const SCHEMA_SQL: &str = "/usr/share/zabbix-sql-scripts/mysql/server.sql.gz";

fn packages(family: OsFamily) -> &'static [&'static str] {
    match family {
        OsFamily::DebianLike => &["zabbix-server-mysql", "zabbix-frontend-php"],
        OsFamily::RhelLike => &["zabbix-server-mysql", "zabbix-web-mysql"],
    }
}

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    let db_password = monitoring_db_password(ctx.cfg);

    step!("monitoring-server: installing Zabbix server");
    PkgProvider::new(gw, ctx.platform.family).install(packages(ctx.platform.family))?;

    // Initial schema import, only while the database is still empty. The
    // credential rides in the environment, never on a command line.
    let schema_present = gw.probe_env(
        "mysql",
        &["-u", "zabbix", "zabbix", "-e", "SELECT 1 FROM users LIMIT 1"],
        &[("MYSQL_PWD", db_password.as_str())],
        false,
    );
    if !schema_present {
        step!("monitoring-server: importing initial schema");
        gw.run_env(
            "sh",
            &["-c", &format!("zcat {SCHEMA_SQL} | mysql -u zabbix zabbix")],
            &[("MYSQL_PWD", db_password.as_str())],
        )?;
    }

    step!("monitoring-server: writing server configuration");
    conf_file::apply_directives(
        gw,
        Path::new(SERVER_CONF),
        '=',
        &[
            ("DBHost", "localhost"),
            ("DBName", "zabbix"),
            ("DBUser", "zabbix"),
            ("DBPassword", db_password.as_str()),
        ],
        true,
    )?;

    service::enable_and_start(gw, SERVICE)?;
    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    step!("monitoring-server: removing Zabbix server");
    service::stop(gw, SERVICE)?;
    if gw.has_service(SERVICE) {
        service::disable(gw, SERVICE)?;
    }
    PkgProvider::new(gw, ctx.platform.family).remove(packages(ctx.platform.family))?;
    // The whole configuration directory is component-owned on this role;
    // the data store under /var/lib/zabbix is not touched.
    let conf_dir = Path::new(CONF_DIR);
    if gw.file_exists(conf_dir) {
        gw.remove_dir_all(conf_dir)?;
    }
    Ok(())
}

/// Effective frontend endpoint, used by the run summary.
pub fn endpoint(hostname: &str) -> String {
    format!("http://{hostname}:8080/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvConfig, Role};
    use crate::gateway::{ExecMode, Gateway};
    use crate::platform::Platform;

    #[test]
    fn planned_actions_never_carry_the_database_credential() {
        let cfg = EnvConfig {
            role: Role::Server,
            site_id: "lab-01".into(),
            server_hostname: "soc.example.org".into(),
            db_root_password: Some("s3cret".into()),
            manager_addr: None,
            install_siem: false,
            install_monitoring: true,
            install_proxy: false,
            install_antivirus: false,
            install_siem_agent: false,
            install_monitoring_agent: false,
        };
        let platform = Platform {
            distro_id: "debian".into(),
            family: OsFamily::DebianLike,
        };
        let gw = Gateway::new(ExecMode::Simulate);
        let ctx = InstallContext { cfg: &cfg, platform: &platform, gw: &gw };

        install(&ctx).unwrap();

        let password = monitoring_db_password(&cfg);
        for action in gw.actions() {
            assert!(
                action.args.iter().all(|a| !a.contains(&password)),
                "credential leaked into: {action}"
            );
        }
    }
}
