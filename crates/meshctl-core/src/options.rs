//! Raw install options as supplied by the operator

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default values for every option the operator may leave unset
pub mod defaults {
    pub const NAMESPACE: &str = "meshctl";
    pub const DOCKER_REGISTRY: &str = "ghcr.io/meshctl";
    pub const IMAGE_PULL_POLICY: &str = "IfNotPresent";
    pub const CONTROLLER_REPLICAS: u32 = 1;
    pub const CONTROLLER_LOG_LEVEL: &str = "info";
    pub const CONTROLLER_UID: i64 = 2103;
    pub const PROXY_LOG_LEVEL: &str = "warn,mesh_proxy=info";
    pub const PROXY_UID: i64 = 2102;
    pub const PROXY_INBOUND_PORT: u16 = 4143;
    pub const PROXY_OUTBOUND_PORT: u16 = 4140;
    pub const PROXY_ADMIN_PORT: u16 = 4191;
    pub const PROXY_CONTROL_PORT: u16 = 4190;
    pub const PROMETHEUS_IMAGE: &str = "prom/prometheus:v2.11.1";
    pub const TRUST_DOMAIN: &str = "cluster.local";
    pub const ISSUANCE_LIFETIME: &str = "24h";
    pub const CLOCK_SKEW_ALLOWANCE: &str = "20s";
}

/// Everything the operator asked for, before validation
///
/// Fields that a mode preset may fill are `Option`s so that an explicit
/// value can be told apart from an unset one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct InstallOptions {
    /// Namespace the control plane is installed into
    pub namespace: String,

    /// Control-plane version, used as the tag for every meshctl image
    pub version: String,

    /// Registry prefix for meshctl images
    pub docker_registry: String,

    pub image_pull_policy: String,

    pub controller_replicas: Option<u32>,

    pub controller_log_level: String,

    pub controller_uid: i64,

    pub controller_cpu_request: Option<String>,

    pub controller_memory_request: Option<String>,

    /// Install the proxy injector webhook
    pub proxy_auto_inject: bool,

    /// Apply the high-availability preset
    pub high_availability: bool,

    /// Rely on the CNI plugin instead of the proxy-init container
    pub no_init_container: bool,

    /// Restrict the control plane to its own namespace
    pub single_namespace: bool,

    pub disable_h2_upgrade: bool,

    pub proxy: ProxyOptions,

    pub identity: IdentityOptions,

    /// Stable install identity; generated when absent
    pub install_uuid: Option<String>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            namespace: defaults::NAMESPACE.to_string(),
            version: crate::VERSION.to_string(),
            docker_registry: defaults::DOCKER_REGISTRY.to_string(),
            image_pull_policy: defaults::IMAGE_PULL_POLICY.to_string(),
            controller_replicas: None,
            controller_log_level: defaults::CONTROLLER_LOG_LEVEL.to_string(),
            controller_uid: defaults::CONTROLLER_UID,
            controller_cpu_request: None,
            controller_memory_request: None,
            proxy_auto_inject: false,
            high_availability: false,
            no_init_container: false,
            single_namespace: false,
            disable_h2_upgrade: false,
            proxy: ProxyOptions::default(),
            identity: IdentityOptions::default(),
            install_uuid: None,
        }
    }
}

/// Settings for the data-plane proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProxyOptions {
    /// Proxy image name; defaults to `<registry>/proxy`
    pub image: Option<String>,

    /// Proxy-init image name; defaults to `<registry>/proxy-init`
    pub init_image: Option<String>,

    pub log_level: String,

    pub uid: i64,

    pub inbound_port: u16,

    pub outbound_port: u16,

    pub admin_port: u16,

    pub control_port: u16,

    pub ignore_inbound_ports: Vec<u16>,

    pub ignore_outbound_ports: Vec<u16>,

    pub cpu_request: Option<String>,

    pub memory_request: Option<String>,

    pub cpu_limit: Option<String>,

    pub memory_limit: Option<String>,

    pub enable_external_profiles: bool,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            image: None,
            init_image: None,
            log_level: defaults::PROXY_LOG_LEVEL.to_string(),
            uid: defaults::PROXY_UID,
            inbound_port: defaults::PROXY_INBOUND_PORT,
            outbound_port: defaults::PROXY_OUTBOUND_PORT,
            admin_port: defaults::PROXY_ADMIN_PORT,
            control_port: defaults::PROXY_CONTROL_PORT,
            ignore_inbound_ports: Vec::new(),
            ignore_outbound_ports: Vec::new(),
            cpu_request: None,
            memory_request: None,
            cpu_limit: None,
            memory_limit: None,
            enable_external_profiles: false,
        }
    }
}

/// Where to find the identity issuer material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentityOptions {
    pub trust_domain: String,

    pub trust_anchors_file: Option<PathBuf>,

    pub issuer_certificate_file: Option<PathBuf>,

    pub issuer_key_file: Option<PathBuf>,

    pub issuance_lifetime: String,

    pub clock_skew_allowance: String,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            trust_domain: defaults::TRUST_DOMAIN.to_string(),
            trust_anchors_file: None,
            issuer_certificate_file: None,
            issuer_key_file: None,
            issuance_lifetime: defaults::ISSUANCE_LIFETIME.to_string(),
            clock_skew_allowance: defaults::CLOCK_SKEW_ALLOWANCE.to_string(),
        }
    }
}

impl InstallOptions {
    /// Options with every default applied
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from YAML; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub(crate) fn image_ref(&self, name: &str) -> String {
        format!("{}/{}:{}", self.docker_registry, name, self.version)
    }

    pub(crate) fn image_name(&self, name: &str) -> String {
        format!("{}/{}", self.docker_registry, name)
    }
}
