//! Host platform detection.
//!
//! Classifies the running distribution into one of two OS families. Every
//! component installer dispatches on the family only, never on the raw
//! distribution id, so per-host behavior is a two-way switch.

use std::fs;
use std::path::Path;

use log::warn;
use thiserror::Error;

const OS_RELEASE: &str = "/etc/os-release";

const DEBIAN_IDS: &[&str] = &["debian", "ubuntu", "linuxmint", "pop", "raspbian", "kali"];
const RHEL_IDS: &[&str] = &["rhel", "centos", "rocky", "almalinux", "fedora", "ol", "amzn"];

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("cannot detect platform: {0} is missing")]
    Undetectable(String),
}

/// Coarse platform classification driving package/service mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    DebianLike,
    RhelLike,
}

#[derive(Debug, Clone)]
pub struct Platform {
    /// Raw `ID=` value from os-release, kept for log output only.
    pub distro_id: String,
    pub family: OsFamily,
}

impl Platform {
    /// Detect the running host from `/etc/os-release`.
    pub fn detect() -> Result<Self, PlatformError> {
        Self::detect_from(Path::new(OS_RELEASE))
    }

    /// Detect from an explicit os-release file (test seam).
    pub fn detect_from(path: &Path) -> Result<Self, PlatformError> {
        let raw = fs::read_to_string(path)
            .map_err(|_| PlatformError::Undetectable(path.display().to_string()))?;
        let distro_id = raw
            .lines()
            .find_map(|line| line.strip_prefix("ID="))
            .map(|v| v.trim().trim_matches('"').to_ascii_lowercase())
            .unwrap_or_default();

        let family = if DEBIAN_IDS.contains(&distro_id.as_str()) {
            OsFamily::DebianLike
        } else if RHEL_IDS.contains(&distro_id.as_str()) {
            OsFamily::RhelLike
        } else {
            // Deliberate documented default, not a silent failure.
            warn!("unrecognized distribution id '{distro_id}', assuming a debian-like platform");
            OsFamily::DebianLike
        };

        Ok(Platform { distro_id, family })
    }
}
