//! Execution gateway: the single chokepoint for state-changing actions.
//!
//! Every command, file write and service operation in this crate goes through
//! a [`Gateway`]. In live mode actions run against the real system and
//! failures are surfaced to the caller. In simulate mode nothing is mutated;
//! each attempted action is recorded with its full argument list, in the
//! exact order a live run would execute it, so the plan printed at the end of
//! a dry run is a faithful preview.
//!
//! Read-only capability probes (`has_package`, `service_active`, ...) never
//! enter the action log. In simulate mode they answer with a caller-chosen
//! default so the preview is deterministic regardless of the host the dry
//! run happens to execute on.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use log::debug;
use serde::Serialize;

use crate::platform::OsFamily;

/// Process-wide execution mode, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Live,
    Simulate,
}

/// One recorded state-changing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub verb: &'static str,
    pub args: Vec<String>,
}

impl Action {
    fn new(verb: &'static str, args: Vec<String>) -> Self {
        Action { verb, args }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.verb, self.args.join(" "))
    }
}

pub struct Gateway {
    mode: ExecMode,
    // Append-only after start; the mutex only keeps the API `&self`, the
    // orchestration itself is single-threaded.
    actions: Mutex<Vec<Action>>,
    pkg_index_refreshed: AtomicBool,
}

impl Gateway {
    pub fn new(mode: ExecMode) -> Self {
        Gateway {
            mode,
            actions: Mutex::new(Vec::new()),
            pkg_index_refreshed: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Snapshot of the recorded action log, in run order.
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// True exactly once per run; the package provider uses this to refresh
    /// the package index before the first install only.
    pub fn claim_pkg_index_refresh(&self) -> bool {
        !self.pkg_index_refreshed.swap(true, Ordering::Relaxed)
    }

    fn record(&self, verb: &'static str, args: Vec<String>) {
        let action = Action::new(verb, args);
        if let Ok(json) = serde_json::to_string(&action) {
            debug!("action: {json}");
        }
        if let Ok(mut log) = self.actions.lock() {
            log.push(action);
        }
    }

    /// Run a command, surfacing a non-zero exit with its captured stderr.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        self.run_full(program, args, &[], None)
    }

    /// Run a command with extra environment variables set.
    pub fn run_env(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<()> {
        self.run_full(program, args, envs, None)
    }

    /// Run a command feeding `stdin` to it (SQL statements and the like).
    pub fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &str) -> Result<()> {
        self.run_full(program, args, &[], Some(stdin))
    }

    /// Run a command with both extra environment variables and stdin.
    /// Credentials travel this way; argv is visible to every local user.
    pub fn run_env_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
        stdin: &str,
    ) -> Result<()> {
        self.run_full(program, args, envs, Some(stdin))
    }

    fn run_full(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
        stdin: Option<&str>,
    ) -> Result<()> {
        let mut recorded: Vec<String> = envs
            .iter()
            .map(|(k, v)| {
                // Credential-bearing variables never reach the log or plan.
                if k.contains("PASSWORD") || k.contains("PWD") {
                    format!("{k}=<redacted>")
                } else {
                    format!("{k}={v}")
                }
            })
            .collect();
        recorded.push(program.to_string());
        recorded.extend(args.iter().map(|a| a.to_string()));
        if stdin.is_some() {
            recorded.push("<stdin>".to_string());
        }
        self.record("exec", recorded);

        if self.mode == ExecMode::Simulate {
            return Ok(());
        }

        let mut cmd = Command::new(program);
        cmd.args(args);
        for (k, v) in envs {
            cmd.env(k, v);
        }
        let output = if let Some(input) = stdin {
            use std::io::Write;
            use std::process::Stdio;
            let mut child = cmd
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .with_context(|| format!("failed to spawn {program}"))?;
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .with_context(|| format!("failed to write stdin of {program}"))?;
            }
            child
                .wait_with_output()
                .with_context(|| format!("failed to wait for {program}"))?
        } else {
            cmd.output()
                .with_context(|| format!("failed to execute {program}"))?
        };

        if !output.status.success() {
            bail!(
                "{program} {} failed ({}): {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    /// Create or replace a file, creating parent directories as needed.
    pub fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.record(
            "write-file",
            vec![path.display().to_string(), format!("{} bytes", contents.len())],
        );
        if self.mode == ExecMode::Simulate {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Append one line to a file, creating it (and parent directories) if
    /// absent.
    pub fn append_line(&self, path: &Path, line: &str) -> Result<()> {
        self.record(
            "append-line",
            vec![path.display().to_string(), line.to_string()],
        );
        if self.mode == ExecMode::Simulate {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("failed to append to {}", path.display()))
    }

    /// Copy a file aside before the first modification of a run.
    pub fn backup_file(&self, path: &Path) -> Result<()> {
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let backup = format!("{}.socforge.bak-{stamp}", path.display());
        self.record(
            "backup-file",
            vec![path.display().to_string(), backup.clone()],
        );
        if self.mode == ExecMode::Simulate {
            return Ok(());
        }
        fs::copy(path, &backup)
            .with_context(|| format!("failed to back up {} to {backup}", path.display()))?;
        Ok(())
    }

    pub fn remove_file(&self, path: &Path) -> Result<()> {
        self.record("remove-file", vec![path.display().to_string()]);
        if self.mode == ExecMode::Simulate {
            return Ok(());
        }
        fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))
    }

    /// Remove a directory tree. For component-owned configuration
    /// directories only; persisted data stores are never passed here.
    pub fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.record("remove-dir", vec![path.display().to_string()]);
        if self.mode == ExecMode::Simulate {
            return Ok(());
        }
        fs::remove_dir_all(path).with_context(|| format!("failed to remove {}", path.display()))
    }

    /// Read-only probe: run a command and report whether it succeeded.
    /// Never recorded; in simulate mode answers `simulate_default`.
    pub fn probe(&self, program: &str, args: &[&str], simulate_default: bool) -> bool {
        self.probe_env(program, args, &[], simulate_default)
    }

    /// Probe variant with extra environment variables (credential-bearing
    /// probes keep the secret out of argv).
    pub fn probe_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
        simulate_default: bool,
    ) -> bool {
        if self.mode == ExecMode::Simulate {
            return simulate_default;
        }
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (k, v) in envs {
            cmd.env(k, v);
        }
        cmd.output().map(|o| o.status.success()).unwrap_or(false)
    }

    /// Read-only probe for a path. In simulate mode reports absent so the
    /// plan shows what a fresh host would get.
    pub fn file_exists(&self, path: &Path) -> bool {
        if self.mode == ExecMode::Simulate {
            return false;
        }
        path.exists()
    }

    /// Is the named package installed, per the family's package database.
    pub fn has_package(&self, family: OsFamily, name: &str) -> bool {
        match family {
            OsFamily::DebianLike => self.probe("dpkg", &["-s", name], false),
            OsFamily::RhelLike => self.probe("rpm", &["-q", name], false),
        }
    }

    /// Does a unit file exist for the named service.
    pub fn has_service(&self, name: &str) -> bool {
        self.probe("systemctl", &["cat", &format!("{name}.service")], false)
    }

    /// Is the named service currently active.
    pub fn service_active(&self, name: &str) -> bool {
        self.probe("systemctl", &["is-active", "--quiet", name], false)
    }
}
