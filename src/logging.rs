//! Logger setup: timestamped stderr output plus, in live mode, an append-only
//! on-disk run log. The run log is an observability sink only; nothing in the
//! control flow depends on it.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use once_cell::sync::OnceCell;

use crate::gateway::ExecMode;

/// Log target rendered as the STEP severity (per-component progress marks).
pub const STEP_TARGET: &str = "socforge::step";

const RUN_LOG_PATH: &str = "/var/log/socforge/socforge.log";

static RUN_LOG: OnceCell<Mutex<File>> = OnceCell::new();

/// Log a STEP-severity progress line.
#[macro_export]
macro_rules! step {
    ($($arg:tt)*) => {
        log::info!(target: $crate::logging::STEP_TARGET, $($arg)*)
    };
}

/// Initialize the global logger. Safe to call more than once (tests).
pub fn init(verbose: bool, mode: ExecMode) -> Result<()> {
    if mode == ExecMode::Live {
        open_run_log();
    }

    let filter = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = if record.target() == STEP_TARGET {
                "STEP"
            } else {
                record.level().as_str()
            };
            if let Some(file) = RUN_LOG.get() {
                if let Ok(mut file) = file.lock() {
                    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                    let _ = writeln!(file, "[{stamp} {level}] {}", record.args());
                }
            }
            writeln!(buf, "[{} {level}] {}", buf.timestamp_seconds(), record.args())
        })
        .filter_level(filter)
        .try_init();
    Ok(())
}

fn open_run_log() {
    let path = Path::new(RUN_LOG_PATH);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let _ = RUN_LOG.set(Mutex::new(file));
        }
        Err(e) => {
            // Not fatal: the run proceeds with stderr logging only.
            eprintln!("warning: cannot open run log {RUN_LOG_PATH}: {e}");
        }
    }
}
