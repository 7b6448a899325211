//! Environment configuration loader.
//!
//! Reads a flat `KEY=VALUE` file once at process start and produces an
//! immutable, strongly typed [`EnvConfig`]. All validation happens here:
//! unknown keys, missing required keys and placeholder credentials are
//! rejected before any system state is touched. Checks are fail-fast; the
//! first violation found is the one reported.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default location of the environment file, overridable with `-e/--env`.
pub const DEFAULT_ENV_PATH: &str = "/etc/socforge/socforge.env";

/// Documented placeholder shipped in `socforge.env.example`. A credential
/// key still carrying this value aborts the run before any mutation.
pub const PLACEHOLDER_CREDENTIAL: &str = "changeme-socforge";

const KNOWN_KEYS: &[&str] = &[
    "SOC_ROLE",
    "SITE_ID",
    "SERVER_HOSTNAME",
    "DB_ROOT_PASSWORD",
    "MANAGER_ADDR",
    "INSTALL_SIEM",
    "INSTALL_MONITORING",
    "INSTALL_PROXY",
    "INSTALL_ANTIVIRUS",
    "INSTALL_SIEM_AGENT",
    "INSTALL_MONITORING_AGENT",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment file not found: {0}")]
    MissingSource(PathBuf),

    #[error("failed to read environment file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {0} is not a KEY=VALUE setting")]
    MalformedLine(usize),

    #[error("unknown setting: {0}")]
    UnknownKey(String),

    #[error("SOC_ROLE must be 'server' or 'client', got '{0}'")]
    InvalidRole(String),

    #[error("required setting {0} is missing or empty")]
    MissingRequiredKey(&'static str),

    #[error("{0} still has the placeholder value; set a real credential before installing")]
    UnsafeDefaultValue(&'static str),
}

/// Which half of the stack this host receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub role: Role,
    pub site_id: String,
    pub server_hostname: String,
    /// Required for the server role.
    pub db_root_password: Option<String>,
    /// Address of the management server; required for the client role.
    pub manager_addr: Option<String>,
    pub install_siem: bool,
    pub install_monitoring: bool,
    pub install_proxy: bool,
    pub install_antivirus: bool,
    pub install_siem_agent: bool,
    pub install_monitoring_agent: bool,
}

impl EnvConfig {
    /// Load and validate the environment file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingSource(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut values: HashMap<String, String> = HashMap::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine(idx + 1));
            };
            let key = key.trim();
            if !KNOWN_KEYS.contains(&key) {
                return Err(ConfigError::UnknownKey(key.to_string()));
            }
            values.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        let role = match values.get("SOC_ROLE").map(String::as_str) {
            None | Some("") => return Err(ConfigError::MissingRequiredKey("SOC_ROLE")),
            Some("server") => Role::Server,
            Some("client") => Role::Client,
            Some(other) => return Err(ConfigError::InvalidRole(other.to_string())),
        };

        let cfg = EnvConfig {
            role,
            site_id: required(&values, "SITE_ID")?,
            server_hostname: required(&values, "SERVER_HOSTNAME")?,
            db_root_password: optional(&values, "DB_ROOT_PASSWORD"),
            manager_addr: optional(&values, "MANAGER_ADDR"),
            install_siem: flag(&values, "INSTALL_SIEM"),
            install_monitoring: flag(&values, "INSTALL_MONITORING"),
            install_proxy: flag(&values, "INSTALL_PROXY"),
            install_antivirus: flag(&values, "INSTALL_ANTIVIRUS"),
            install_siem_agent: flag(&values, "INSTALL_SIEM_AGENT"),
            install_monitoring_agent: flag(&values, "INSTALL_MONITORING_AGENT"),
        };

        // Role-specific required keys, then the unsafe-default check, in a
        // fixed order so the reported violation is deterministic.
        match cfg.role {
            Role::Server => {
                if cfg.db_root_password.is_none() {
                    return Err(ConfigError::MissingRequiredKey("DB_ROOT_PASSWORD"));
                }
            }
            Role::Client => {
                if cfg.manager_addr.is_none() {
                    return Err(ConfigError::MissingRequiredKey("MANAGER_ADDR"));
                }
            }
        }
        if cfg.db_root_password.as_deref() == Some(PLACEHOLDER_CREDENTIAL) {
            return Err(ConfigError::UnsafeDefaultValue("DB_ROOT_PASSWORD"));
        }

        Ok(cfg)
    }
}

fn required(values: &HashMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    match values.get(key) {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::MissingRequiredKey(key)),
    }
}

fn optional(values: &HashMap<String, String>, key: &str) -> Option<String> {
    values.get(key).filter(|v| !v.is_empty()).cloned()
}

/// Two-value convention: `"true"` enables, anything else disables.
fn flag(values: &HashMap<String, String>, key: &str) -> bool {
    values.get(key).map(String::as_str) == Some("true")
}

fn unquote(value: &str) -> &str {
    let v = value.strip_prefix('"').and_then(|v| v.strip_suffix('"'));
    v.or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}
