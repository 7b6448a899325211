//! Component registry: the fixed, dependency-ordered list of installable
//! units per role.
//!
//! Registry order already satisfies a topological sort of the declared
//! dependency lists; [`verify_order`] asserts it rather than trusting
//! registration order alone. Components without an enablement flag are
//! mandatory and precede every flagged component.

use crate::components::{
    InstallContext, antivirus, database, monitoring_agent, monitoring_server, proxy, siem_agent,
    siem_manager,
};
use crate::config::{EnvConfig, Role};
use crate::error::ComponentError;

type InstallFn = fn(&InstallContext) -> Result<(), ComponentError>;
type FlagFn = fn(&EnvConfig) -> bool;
type EndpointFn = fn(&EnvConfig) -> String;

/// One installable unit of the stack.
#[derive(Clone, Copy)]
pub struct ComponentDescriptor {
    pub name: &'static str,
    /// Enablement predicate; `None` marks a mandatory component.
    pub flag: Option<FlagFn>,
    /// Components that must have completed successfully first.
    pub deps: &'static [&'static str],
    pub install: InstallFn,
    pub remove: InstallFn,
    /// Persisted data stores never deleted by the uninstaller.
    pub data_paths: &'static [&'static str],
    /// Effective access endpoint for the run summary.
    pub endpoint: Option<EndpointFn>,
}

fn siem_enabled(cfg: &EnvConfig) -> bool {
    cfg.install_siem
}
fn monitoring_enabled(cfg: &EnvConfig) -> bool {
    cfg.install_monitoring
}
fn proxy_enabled(cfg: &EnvConfig) -> bool {
    cfg.install_proxy
}
fn antivirus_enabled(cfg: &EnvConfig) -> bool {
    cfg.install_antivirus
}
fn siem_agent_enabled(cfg: &EnvConfig) -> bool {
    cfg.install_siem_agent
}
fn monitoring_agent_enabled(cfg: &EnvConfig) -> bool {
    cfg.install_monitoring_agent
}

fn siem_endpoint(cfg: &EnvConfig) -> String {
    format!("{}:1514 (agent enrollment)", cfg.server_hostname)
}
fn monitoring_endpoint(cfg: &EnvConfig) -> String {
    monitoring_server::endpoint(&cfg.server_hostname)
}
fn proxy_endpoint(cfg: &EnvConfig) -> String {
    proxy::endpoint(&cfg.server_hostname)
}

static SERVER_REGISTRY: &[ComponentDescriptor] = &[
    ComponentDescriptor {
        name: "database",
        flag: None,
        deps: &[],
        install: database::install,
        remove: database::remove,
        data_paths: &["/var/lib/mysql"],
        endpoint: None,
    },
    ComponentDescriptor {
        name: "siem-manager",
        flag: Some(siem_enabled),
        deps: &[],
        install: siem_manager::install,
        remove: siem_manager::remove,
        data_paths: &["/var/ossec"],
        endpoint: Some(siem_endpoint),
    },
    ComponentDescriptor {
        name: "monitoring-server",
        flag: Some(monitoring_enabled),
        deps: &["database"],
        install: monitoring_server::install,
        remove: monitoring_server::remove,
        data_paths: &["/var/lib/zabbix"],
        endpoint: Some(monitoring_endpoint),
    },
    ComponentDescriptor {
        name: "proxy",
        flag: Some(proxy_enabled),
        deps: &[],
        install: proxy::install,
        remove: proxy::remove,
        data_paths: &[],
        endpoint: Some(proxy_endpoint),
    },
    ComponentDescriptor {
        name: "antivirus",
        flag: Some(antivirus_enabled),
        deps: &[],
        install: antivirus::install,
        remove: antivirus::remove,
        data_paths: &["/var/lib/clamav"],
        endpoint: None,
    },
];

static CLIENT_REGISTRY: &[ComponentDescriptor] = &[
    ComponentDescriptor {
        name: "siem-agent",
        flag: Some(siem_agent_enabled),
        deps: &[],
        install: siem_agent::install,
        remove: siem_agent::remove,
        data_paths: &["/var/ossec"],
        endpoint: None,
    },
    ComponentDescriptor {
        name: "monitoring-agent",
        flag: Some(monitoring_agent_enabled),
        deps: &[],
        install: monitoring_agent::install,
        remove: monitoring_agent::remove,
        data_paths: &[],
        endpoint: None,
    },
    ComponentDescriptor {
        name: "antivirus",
        flag: Some(antivirus_enabled),
        deps: &[],
        install: antivirus::install,
        remove: antivirus::remove,
        data_paths: &["/var/lib/clamav"],
        endpoint: None,
    },
];

/// The dependency-ordered component list for a role.
pub fn registry(role: Role) -> &'static [ComponentDescriptor] {
    match role {
        Role::Server => SERVER_REGISTRY,
        Role::Client => CLIENT_REGISTRY,
    }
}

/// Assert that list order satisfies every declared dependency and that
/// mandatory components precede flagged ones.
pub fn verify_order(components: &[ComponentDescriptor]) -> Result<(), String> {
    let mut seen: Vec<&str> = Vec::new();
    let mut optional_seen = false;
    for c in components {
        if seen.contains(&c.name) {
            return Err(format!("duplicate component name '{}'", c.name));
        }
        for dep in c.deps {
            if !seen.contains(dep) {
                return Err(format!(
                    "component '{}' depends on '{dep}' which is not listed before it",
                    c.name
                ));
            }
        }
        match c.flag {
            None if optional_seen => {
                return Err(format!(
                    "mandatory component '{}' listed after an optional one",
                    c.name
                ));
            }
            None => {}
            Some(_) => optional_seen = true,
        }
        seen.push(c.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_registries_are_topologically_ordered() {
        verify_order(registry(Role::Server)).unwrap();
        verify_order(registry(Role::Client)).unwrap();
    }

    #[test]
    fn database_is_mandatory_and_first_on_the_server() {
        let server = registry(Role::Server);
        assert_eq!(server[0].name, "database");
        assert!(server[0].flag.is_none());
        assert!(server[1..].iter().all(|c| c.flag.is_some()));
    }

    #[test]
    fn verify_order_rejects_forward_dependency() {
        let mut comps: Vec<ComponentDescriptor> = registry(Role::Server).to_vec();
        comps.swap(0, 2); // monitoring-server now precedes database
        assert!(verify_order(&comps).is_err());
    }

    #[test]
    fn verify_order_rejects_mandatory_after_optional() {
        let mut comps: Vec<ComponentDescriptor> = registry(Role::Server).to_vec();
        comps.swap(0, 1);
        let err = verify_order(&comps).unwrap_err();
        assert!(err.contains("mandatory"));
    }

    #[test]
    fn component_names_are_unique_per_role() {
        for role in [Role::Server, Role::Client] {
            let mut names: Vec<_> = registry(role).iter().map(|c| c.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), registry(role).len());
        }
    }
}
