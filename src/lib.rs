//! socforge: idempotent provisioning of a small security-operations stack.
//!
//! The library is organized around four leaves and one core:
//!
//! - `config` - environment file loading and validation
//! - `platform` - OS family detection
//! - `gateway` - the single chokepoint for state-changing actions (live or
//!   simulated)
//! - `privilege` - root check for live runs
//! - `orchestrator`/`registry` - the dependency-ordered component walk
//!
//! Product-specific installers live under `components/`; `pkg`, `service` and
//! `conf_file` are the shared plumbing they build on. `uninstall` mirrors the
//! registry in reverse for selective teardown.

pub mod cli;
pub mod components;
pub mod conf_file;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod orchestrator;
pub mod pkg;
pub mod platform;
pub mod privilege;
pub mod registry;
pub mod service;
pub mod uninstall;
