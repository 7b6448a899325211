//! MariaDB: the mandatory server-role component. Everything else on the
//! server configures itself against this database, so it always runs first.

use log::debug;

use super::{InstallContext, monitoring_db_password, sql_literal};
use crate::error::ComponentError;
use crate::pkg::PkgProvider;
use crate::service;
use crate::step;

pub const SERVICE: &str = "mariadb";
const PACKAGES: &[&str] = &["mariadb-server"];

fn root_credential_sql(password: &str) -> String {
    format!(
        "ALTER USER 'root'@'localhost' IDENTIFIED BY {};\nFLUSH PRIVILEGES;\n",
        sql_literal(password)
    )
}

fn monitoring_schema_sql(password: &str) -> String {
    format!(
        "CREATE DATABASE IF NOT EXISTS zabbix CHARACTER SET utf8mb4 COLLATE utf8mb4_bin;\n\
         CREATE USER IF NOT EXISTS 'zabbix'@'localhost' IDENTIFIED BY {};\n\
         GRANT ALL PRIVILEGES ON zabbix.* TO 'zabbix'@'localhost';\n\
         FLUSH PRIVILEGES;\n",
        sql_literal(password)
    )
}

pub fn install(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    let pkg = PkgProvider::new(gw, ctx.platform.family);

    step!("database: installing MariaDB server");
    pkg.install(PACKAGES)?;
    service::enable_and_start(gw, SERVICE)?;

    // The root password can only be set while unauthenticated root login
    // still works, which is exactly the fresh-install case. On a re-run the
    // probe fails and this block is skipped.
    if gw.probe("mysql", &["-u", "root", "-e", "SELECT 1"], true) {
        step!("database: setting root credential");
        let password = ctx.cfg.db_root_password.as_deref().unwrap_or_default();
        let sql = root_credential_sql(password);
        gw.run_with_stdin("mysql", &["-u", "root"], &sql)?;
    } else {
        debug!("database: root credential already set");
    }

    if ctx.cfg.install_monitoring {
        step!("database: creating monitoring schema");
        let password = monitoring_db_password(ctx.cfg);
        let sql = monitoring_schema_sql(&password);
        let root = ctx.cfg.db_root_password.as_deref().unwrap_or_default();
        // Authenticate through the environment; argv is visible to ps.
        gw.run_env_with_stdin("mysql", &["-u", "root"], &[("MYSQL_PWD", root)], &sql)?;
    }

    Ok(())
}

pub fn remove(ctx: &InstallContext) -> Result<(), ComponentError> {
    let gw = ctx.gw;
    step!("database: removing MariaDB server");
    service::stop(gw, SERVICE)?;
    if gw.has_service(SERVICE) {
        service::disable(gw, SERVICE)?;
    }
    PkgProvider::new(gw, ctx.platform.family).remove(PACKAGES)?;
    Ok(())
}
