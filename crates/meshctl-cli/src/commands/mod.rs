//! CLI commands

pub mod config;
pub mod install;
pub mod validate;

use std::path::PathBuf;

use clap::Args;
use meshctl_core::InstallOptions;

use crate::error::Result;

/// Flags shared by every command that builds an installation
///
/// Precedence, lowest first: built-in defaults, `-f` files in order, then
/// flags and their environment fallbacks.
#[derive(Args, Debug, Default, Clone)]
pub struct InstallArgs {
    /// Options file(s) to merge, in order (YAML, camelCase keys)
    #[arg(short = 'f', long = "values")]
    pub values: Vec<PathBuf>,

    /// Namespace to install the control plane into
    #[arg(long, env = "MESHCTL_NAMESPACE")]
    pub namespace: Option<String>,

    /// Tag used for every control-plane image
    #[arg(long)]
    pub control_plane_version: Option<String>,

    /// Registry prefix for control-plane images
    #[arg(long, env = "MESHCTL_REGISTRY")]
    pub registry: Option<String>,

    /// Image pull policy (Always, IfNotPresent, Never)
    #[arg(long)]
    pub image_pull_policy: Option<String>,

    /// Replicas for each control-plane deployment
    #[arg(long)]
    pub controller_replicas: Option<u32>,

    /// Controller log level (panic, fatal, error, warn, info, debug)
    #[arg(long)]
    pub controller_log_level: Option<String>,

    /// User id the controller containers run as
    #[arg(long)]
    pub controller_uid: Option<i64>,

    #[arg(long)]
    pub controller_cpu_request: Option<String>,

    #[arg(long)]
    pub controller_memory_request: Option<String>,

    /// Install the proxy injector webhook
    #[arg(long)]
    pub proxy_auto_inject: bool,

    /// Apply the high-availability preset
    #[arg(long)]
    pub ha: bool,

    /// Rely on the CNI plugin instead of the proxy-init container
    #[arg(long)]
    pub no_init_container: bool,

    /// Restrict the control plane to its own namespace
    #[arg(long)]
    pub single_namespace: bool,

    /// Stop proxies from upgrading HTTP/1.1 connections to HTTP/2
    #[arg(long)]
    pub disable_h2_upgrade: bool,

    #[arg(long)]
    pub proxy_image: Option<String>,

    #[arg(long)]
    pub init_image: Option<String>,

    /// Proxy log filter, e.g. warn,mesh_proxy=info
    #[arg(long)]
    pub proxy_log_level: Option<String>,

    #[arg(long)]
    pub proxy_uid: Option<i64>,

    #[arg(long)]
    pub inbound_port: Option<u16>,

    #[arg(long)]
    pub outbound_port: Option<u16>,

    #[arg(long)]
    pub admin_port: Option<u16>,

    #[arg(long)]
    pub control_port: Option<u16>,

    /// Inbound ports the proxy does not intercept
    #[arg(long, value_delimiter = ',')]
    pub skip_inbound_ports: Vec<u16>,

    /// Outbound ports the proxy does not intercept
    #[arg(long, value_delimiter = ',')]
    pub skip_outbound_ports: Vec<u16>,

    #[arg(long)]
    pub proxy_cpu_request: Option<String>,

    #[arg(long)]
    pub proxy_memory_request: Option<String>,

    #[arg(long)]
    pub proxy_cpu_limit: Option<String>,

    #[arg(long)]
    pub proxy_memory_limit: Option<String>,

    /// Let proxies resolve service profiles outside the cluster
    #[arg(long)]
    pub enable_external_profiles: bool,

    #[arg(long)]
    pub identity_trust_domain: Option<String>,

    /// PEM file holding the trust anchor certificates
    #[arg(long)]
    pub identity_trust_anchors_file: Option<PathBuf>,

    /// PEM file holding the issuer certificate
    #[arg(long)]
    pub identity_issuer_certificate_file: Option<PathBuf>,

    /// PEM file holding the issuer private key
    #[arg(long)]
    pub identity_issuer_key_file: Option<PathBuf>,

    /// Lifetime of issued certificates, e.g. 24h
    #[arg(long)]
    pub identity_issuance_lifetime: Option<String>,

    /// Clock skew tolerated when validating certificates, e.g. 20s
    #[arg(long)]
    pub identity_clock_skew_allowance: Option<String>,

    /// Reuse an install UUID instead of generating one
    #[arg(long)]
    pub install_uuid: Option<String>,
}

impl InstallArgs {
    /// Layer the options files, then apply every flag that was given
    pub fn options(&self) -> Result<InstallOptions> {
        let mut options = InstallOptions::from_files(&self.values)?;
        self.apply(&mut options);
        Ok(options)
    }

    fn apply(&self, options: &mut InstallOptions) {
        set(&mut options.namespace, &self.namespace);
        set(&mut options.version, &self.control_plane_version);
        set(&mut options.docker_registry, &self.registry);
        set(&mut options.image_pull_policy, &self.image_pull_policy);
        set_opt(&mut options.controller_replicas, self.controller_replicas);
        set(&mut options.controller_log_level, &self.controller_log_level);
        set(&mut options.controller_uid, &self.controller_uid);
        set_opt(&mut options.controller_cpu_request, self.controller_cpu_request.clone());
        set_opt(&mut options.controller_memory_request, self.controller_memory_request.clone());
        set_opt(&mut options.install_uuid, self.install_uuid.clone());

        // a switch can only turn a feature on; files may already have
        options.proxy_auto_inject |= self.proxy_auto_inject;
        options.high_availability |= self.ha;
        options.no_init_container |= self.no_init_container;
        options.single_namespace |= self.single_namespace;
        options.disable_h2_upgrade |= self.disable_h2_upgrade;

        let proxy = &mut options.proxy;
        set_opt(&mut proxy.image, self.proxy_image.clone());
        set_opt(&mut proxy.init_image, self.init_image.clone());
        set(&mut proxy.log_level, &self.proxy_log_level);
        set(&mut proxy.uid, &self.proxy_uid);
        set(&mut proxy.inbound_port, &self.inbound_port);
        set(&mut proxy.outbound_port, &self.outbound_port);
        set(&mut proxy.admin_port, &self.admin_port);
        set(&mut proxy.control_port, &self.control_port);
        if !self.skip_inbound_ports.is_empty() {
            proxy.ignore_inbound_ports = self.skip_inbound_ports.clone();
        }
        if !self.skip_outbound_ports.is_empty() {
            proxy.ignore_outbound_ports = self.skip_outbound_ports.clone();
        }
        set_opt(&mut proxy.cpu_request, self.proxy_cpu_request.clone());
        set_opt(&mut proxy.memory_request, self.proxy_memory_request.clone());
        set_opt(&mut proxy.cpu_limit, self.proxy_cpu_limit.clone());
        set_opt(&mut proxy.memory_limit, self.proxy_memory_limit.clone());
        proxy.enable_external_profiles |= self.enable_external_profiles;

        let identity = &mut options.identity;
        set(&mut identity.trust_domain, &self.identity_trust_domain);
        set_opt(&mut identity.trust_anchors_file, self.identity_trust_anchors_file.clone());
        set_opt(&mut identity.issuer_certificate_file, self.identity_issuer_certificate_file.clone());
        set_opt(&mut identity.issuer_key_file, self.identity_issuer_key_file.clone());
        set(&mut identity.issuance_lifetime, &self.identity_issuance_lifetime);
        set(&mut identity.clock_skew_allowance, &self.identity_clock_skew_allowance);
    }
}

fn set<T: Clone>(target: &mut T, flag: &Option<T>) {
    if let Some(value) = flag {
        *target = value.clone();
    }
}

fn set_opt<T>(target: &mut Option<T>, flag: Option<T>) {
    if flag.is_some() {
        *target = flag;
    }
}
