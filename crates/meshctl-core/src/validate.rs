//! Validation of install options
//!
//! Each rule is a pure function over [`InstallOptions`]. [`InstallOptions::validate`]
//! stops at the first failing rule; [`InstallOptions::validation_errors`]
//! runs all of them so an operator can fix everything in one pass.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PullPolicy;
use crate::error::ValidationError;
use crate::log_level::{ControllerLogLevel, ProxyLogFilter};
use crate::options::InstallOptions;
use crate::quantity::Quantity;

type Check = fn(&InstallOptions) -> Result<(), ValidationError>;

/// Rules in the order they are reported
const CHECKS: &[Check] = &[
    check_namespace,
    check_controller_log_level,
    check_proxy_log_level,
    check_image_pull_policy,
    check_registry,
    check_replicas,
    check_uids,
    check_controller_resources,
    check_proxy_resources,
    check_ports,
    check_flag_policy,
    check_identity,
    check_install_uuid,
];

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("valid regex"));

static DNS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

impl InstallOptions {
    /// Check every rule, returning the first violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        for check in CHECKS {
            check(self)?;
        }
        Ok(())
    }

    /// Check every rule, returning all violations in rule order
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        CHECKS.iter().filter_map(|check| check(self).err()).collect()
    }
}

fn check_namespace(options: &InstallOptions) -> Result<(), ValidationError> {
    if DNS_LABEL.is_match(&options.namespace) {
        Ok(())
    } else {
        Err(ValidationError::Namespace {
            value: options.namespace.clone(),
        })
    }
}

fn check_controller_log_level(options: &InstallOptions) -> Result<(), ValidationError> {
    options
        .controller_log_level
        .parse::<ControllerLogLevel>()
        .map(drop)
}

fn check_proxy_log_level(options: &InstallOptions) -> Result<(), ValidationError> {
    options.proxy.log_level.parse::<ProxyLogFilter>().map(drop)
}

fn check_image_pull_policy(options: &InstallOptions) -> Result<(), ValidationError> {
    options.image_pull_policy.parse::<PullPolicy>().map(drop)
}

fn check_registry(options: &InstallOptions) -> Result<(), ValidationError> {
    if options.docker_registry.is_empty() {
        return Err(ValidationError::Empty {
            flag: "--registry",
        });
    }
    if options.version.is_empty() {
        return Err(ValidationError::Empty {
            flag: "--control-plane-version",
        });
    }
    Ok(())
}

fn check_replicas(options: &InstallOptions) -> Result<(), ValidationError> {
    match options.controller_replicas {
        Some(0) => Err(ValidationError::ReplicaCount {
            flag: "--controller-replicas",
            value: 0,
        }),
        _ => Ok(()),
    }
}

fn check_uids(options: &InstallOptions) -> Result<(), ValidationError> {
    for (flag, value) in [
        ("--controller-uid", options.controller_uid),
        ("--proxy-uid", options.proxy.uid),
    ] {
        if value < 0 {
            return Err(ValidationError::NegativeUid { flag, value });
        }
    }
    Ok(())
}

pub(crate) fn parse_quantity(
    flag: &'static str,
    value: Option<&str>,
) -> Result<Option<Quantity>, ValidationError> {
    value
        .map(|v| {
            Quantity::parse(v).map_err(|reason| ValidationError::Quantity {
                flag,
                value: v.to_string(),
                reason,
            })
        })
        .transpose()
}

fn check_controller_resources(options: &InstallOptions) -> Result<(), ValidationError> {
    parse_quantity(
        "--controller-cpu-request",
        options.controller_cpu_request.as_deref(),
    )?;
    parse_quantity(
        "--controller-memory-request",
        options.controller_memory_request.as_deref(),
    )?;
    Ok(())
}

fn check_proxy_resources(options: &InstallOptions) -> Result<(), ValidationError> {
    let proxy = &options.proxy;
    parse_quantity("--proxy-cpu-request", proxy.cpu_request.as_deref())?;
    parse_quantity("--proxy-memory-request", proxy.memory_request.as_deref())?;
    parse_quantity("--proxy-cpu-limit", proxy.cpu_limit.as_deref())?;
    parse_quantity("--proxy-memory-limit", proxy.memory_limit.as_deref())?;
    Ok(())
}

fn check_ports(options: &InstallOptions) -> Result<(), ValidationError> {
    let proxy = &options.proxy;
    let ports = [
        ("--inbound-port", proxy.inbound_port),
        ("--outbound-port", proxy.outbound_port),
        ("--admin-port", proxy.admin_port),
        ("--control-port", proxy.control_port),
    ];

    for (flag, port) in ports {
        if port == 0 {
            return Err(ValidationError::Port { flag });
        }
    }

    for (i, &(first, port)) in ports.iter().enumerate() {
        if let Some(&(second, _)) = ports[i + 1..].iter().find(|(_, other)| *other == port) {
            return Err(ValidationError::PortConflict {
                first,
                second,
                port,
            });
        }
    }

    if let Some(flag) = proxy
        .ignore_inbound_ports
        .contains(&0)
        .then_some("--skip-inbound-ports")
        .or_else(|| proxy.ignore_outbound_ports.contains(&0).then_some("--skip-outbound-ports"))
    {
        return Err(ValidationError::Port { flag });
    }

    Ok(())
}

/// Combinations of feature flags
///
/// Every combination is listed. Auto-injection with no init container is
/// allowed: the injector is told to leave the init container out and the
/// CNI plugin sets up traffic redirection instead.
fn check_flag_policy(options: &InstallOptions) -> Result<(), ValidationError> {
    match (
        options.proxy_auto_inject,
        options.single_namespace,
        options.no_init_container,
    ) {
        (true, true, _) => Err(ValidationError::MutuallyExclusive {
            first: "--proxy-auto-inject",
            second: "--single-namespace",
        }),
        (true, false, true) => Ok(()),
        (true, false, false) => Ok(()),
        (false, _, _) => Ok(()),
    }
}

fn check_identity(options: &InstallOptions) -> Result<(), ValidationError> {
    let identity = &options.identity;

    if !DNS_NAME.is_match(&identity.trust_domain) {
        return Err(ValidationError::TrustDomain {
            value: identity.trust_domain.clone(),
        });
    }

    for (flag, value) in [
        ("--identity-issuance-lifetime", &identity.issuance_lifetime),
        (
            "--identity-clock-skew-allowance",
            &identity.clock_skew_allowance,
        ),
    ] {
        if humantime::parse_duration(value).is_err() {
            return Err(ValidationError::Duration {
                flag,
                value: value.clone(),
            });
        }
    }

    let files = [
        ("--identity-trust-anchors-file", &identity.trust_anchors_file),
        (
            "--identity-issuer-certificate-file",
            &identity.issuer_certificate_file,
        ),
        ("--identity-issuer-key-file", &identity.issuer_key_file),
    ];
    for (flag, path) in files {
        match path {
            Some(path) if !path.as_os_str().is_empty() => {}
            _ => return Err(ValidationError::MissingIdentity { flag }),
        }
    }

    Ok(())
}

fn check_install_uuid(options: &InstallOptions) -> Result<(), ValidationError> {
    match &options.install_uuid {
        Some(value) if uuid::Uuid::parse_str(value).is_err() => Err(ValidationError::Uuid {
            value: value.clone(),
        }),
        _ => Ok(()),
    }
}
