//! Idempotent configuration-file editing.
//!
//! Directives are applied with create-or-update semantics: an existing
//! `key<sep>value` line is rewritten in place, a missing one is appended,
//! and a file that already matches is left untouched (no write, no backup).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

use crate::gateway::Gateway;

/// Apply `directives` to `path`. Returns whether the file changed.
///
/// The existing file is backed up once before the first modification when
/// `backup` is set.
pub fn apply_directives(
    gw: &Gateway,
    path: &Path,
    sep: char,
    directives: &[(&str, &str)],
    backup: bool,
) -> Result<bool> {
    // Reading is not a state change; look at the real file even in simulate
    // mode so the preview reflects what would actually be rewritten.
    let current = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let mut lines: Vec<String> = current.lines().map(str::to_string).collect();
    let mut rewrote = false;
    let mut appended: Vec<String> = Vec::new();
    for (key, value) in directives {
        let wanted = format!("{key}{sep}{value}");
        let prefix = format!("{key}{sep}");
        match lines.iter().position(|l| l.trim_start().starts_with(&prefix)) {
            Some(i) if lines[i] == wanted => {}
            Some(i) => {
                lines[i] = wanted;
                rewrote = true;
            }
            None => {
                appended.push(wanted.clone());
                lines.push(wanted);
            }
        }
    }

    if !rewrote && appended.is_empty() {
        debug!("{} already up to date", path.display());
        return Ok(false);
    }

    if backup && !current.is_empty() {
        gw.backup_file(path)?;
    }

    // Pure additions to an existing file append in place rather than
    // rewriting the whole file.
    if !rewrote && !current.is_empty() && current.ends_with('\n') {
        for line in &appended {
            gw.append_line(path, line)?;
        }
        return Ok(true);
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    gw.write_file(path, &updated)?;
    Ok(true)
}

/// Write `contents` to `path` unless the file already matches byte for byte.
/// Returns whether a write was issued.
pub fn write_if_changed(gw: &Gateway, path: &Path, contents: &str) -> Result<bool> {
    if fs::read_to_string(path).map(|c| c == contents).unwrap_or(false) {
        debug!("{} already up to date", path.display());
        return Ok(false);
    }
    gw.write_file(path, contents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ExecMode;

    #[test]
    fn creates_file_with_directives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.conf");
        let gw = Gateway::new(ExecMode::Live);

        let changed =
            apply_directives(&gw, &path, '=', &[("Server", "10.0.0.5"), ("Hostname", "edge")], true)
                .unwrap();
        assert!(changed);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Server=10.0.0.5\nHostname=edge\n"
        );
        // No backup for a file that did not exist yet.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn updates_existing_key_and_preserves_other_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.conf");
        fs::write(&path, "# managed\nDBHost=localhost\nDBName=zabbix\n").unwrap();
        let gw = Gateway::new(ExecMode::Live);

        apply_directives(&gw, &path, '=', &[("DBHost", "db.internal")], false).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# managed\nDBHost=db.internal\nDBName=zabbix\n"
        );
    }

    #[test]
    fn missing_keys_append_without_rewriting_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.conf");
        fs::write(&path, "# stock config\nLogFileSize=0\n").unwrap();
        let gw = Gateway::new(ExecMode::Live);

        let changed = apply_directives(
            &gw,
            &path,
            '=',
            &[("Server", "10.0.0.5"), ("ServerActive", "10.0.0.5")],
            false,
        )
        .unwrap();
        assert!(changed);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# stock config\nLogFileSize=0\nServer=10.0.0.5\nServerActive=10.0.0.5\n"
        );
        assert!(gw.actions().iter().all(|a| a.verb == "append-line"));
    }

    #[test]
    fn second_application_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.conf");
        let gw = Gateway::new(ExecMode::Live);

        apply_directives(&gw, &path, '=', &[("Server", "10.0.0.5")], true).unwrap();
        let actions_before = gw.actions().len();
        let changed = apply_directives(&gw, &path, '=', &[("Server", "10.0.0.5")], true).unwrap();
        assert!(!changed);
        assert_eq!(gw.actions().len(), actions_before);
    }

    #[test]
    fn backup_taken_before_modifying_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.conf");
        fs::write(&path, "DBHost=localhost\n").unwrap();
        let gw = Gateway::new(ExecMode::Live);

        apply_directives(&gw, &path, '=', &[("DBHost", "db.internal")], true).unwrap();
        let backups = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".socforge.bak-"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn simulate_records_write_but_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.conf");
        fs::write(&path, "DBHost=localhost\n").unwrap();
        let gw = Gateway::new(ExecMode::Simulate);

        let changed = apply_directives(&gw, &path, '=', &[("DBHost", "db.internal")], true).unwrap();
        assert!(changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "DBHost=localhost\n");
        assert!(gw.actions().iter().any(|a| a.verb == "write-file"));
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.conf");
        fs::write(&path, "server {}\n").unwrap();
        let gw = Gateway::new(ExecMode::Live);

        assert!(!write_if_changed(&gw, &path, "server {}\n").unwrap());
        assert!(write_if_changed(&gw, &path, "server { listen 80; }\n").unwrap());
    }
}
