//! Options → canonical configuration
//!
//! [`build`] is the only way validated options become a [`Config`] and its
//! [`InstallValues`] projection. Validation runs first and short-circuits;
//! defaults and presets are only ever applied to valid options.

use std::time::Duration;

use crate::config::{
    Config, GlobalConfig, IdentityContext, Image, InstallConfig, ProxyConfig, PullPolicy,
    ResourceRequirements,
};
use crate::error::{BuildError, CoreError, Result, ValidationError};
use crate::identity::{CredentialSource, IdentityMaterial};
use crate::log_level::{ControllerLogLevel, ProxyLogFilter};
use crate::options::{InstallOptions, defaults};
use crate::preset::Preset;
use crate::validate::parse_quantity;
use crate::values::{
    CONTROLLER_COMPONENT_LABEL, CREATED_BY_ANNOTATION, IdentityValues, InstallValues,
    IssuerValues, PROXY_CONTAINER_NAME, PROXY_INJECT_ANNOTATION, PROXY_INJECT_DISABLED,
};

/// Validate options, apply defaults and presets, and produce the render inputs
pub fn build(
    options: &InstallOptions,
    credentials: &dyn CredentialSource,
) -> Result<(InstallValues, Config)> {
    options.validate()?;

    let mut resolved = options.clone();
    for preset in Preset::selected(options) {
        preset.apply(&mut resolved);
    }

    let identity = IdentityMaterial::load(&resolved.identity, credentials)?;
    let config = build_config(&resolved, &identity)?;
    let values = build_values(&resolved, &config, &identity)?;

    if let Some(field) = values.first_missing_field() {
        return Err(BuildError::Incomplete { field }.into());
    }

    Ok((values, config))
}

/// Derive the canonical configuration from resolved options
pub fn build_config(options: &InstallOptions, identity: &IdentityMaterial) -> Result<Config> {
    let pull_policy: PullPolicy = options.image_pull_policy.parse()?;
    let proxy_log_level: ProxyLogFilter = options.proxy.log_level.parse()?;

    let uuid = match &options.install_uuid {
        Some(uuid) => uuid.clone(),
        None => {
            let uuid = uuid::Uuid::new_v4().to_string();
            tracing::debug!(%uuid, "generated install uuid");
            uuid
        }
    };

    let proxy = &options.proxy;

    Ok(Config {
        global: GlobalConfig {
            namespace: options.namespace.clone(),
            cni_enabled: options.no_init_container,
            version: options.version.clone(),
            identity_context: IdentityContext {
                trust_domain: options.identity.trust_domain.clone(),
                trust_anchors_pem: identity.trust_anchors_pem.clone(),
                issuance_lifetime: parse_duration(
                    "--identity-issuance-lifetime",
                    &options.identity.issuance_lifetime,
                )?,
                clock_skew_allowance: parse_duration(
                    "--identity-clock-skew-allowance",
                    &options.identity.clock_skew_allowance,
                )?,
            },
        },
        proxy: ProxyConfig {
            proxy_image: Image {
                image_name: proxy
                    .image
                    .clone()
                    .unwrap_or_else(|| options.image_name("proxy")),
                pull_policy,
            },
            proxy_init_image: Image {
                image_name: proxy
                    .init_image
                    .clone()
                    .unwrap_or_else(|| options.image_name("proxy-init")),
                pull_policy,
            },
            control_port: proxy.control_port,
            ignore_inbound_ports: proxy.ignore_inbound_ports.clone(),
            ignore_outbound_ports: proxy.ignore_outbound_ports.clone(),
            inbound_port: proxy.inbound_port,
            admin_port: proxy.admin_port,
            outbound_port: proxy.outbound_port,
            resource: ResourceRequirements {
                request_cpu: parse_quantity("--proxy-cpu-request", proxy.cpu_request.as_deref())?,
                request_memory: parse_quantity(
                    "--proxy-memory-request",
                    proxy.memory_request.as_deref(),
                )?,
                limit_cpu: parse_quantity("--proxy-cpu-limit", proxy.cpu_limit.as_deref())?,
                limit_memory: parse_quantity(
                    "--proxy-memory-limit",
                    proxy.memory_limit.as_deref(),
                )?,
            },
            proxy_uid: proxy.uid,
            log_level: proxy_log_level,
            disable_external_profiles: !proxy.enable_external_profiles,
        },
        install: InstallConfig {
            uuid,
            cli_version: format!("meshctl/cli {}", options.version),
            high_availability: options.high_availability,
        },
    })
}

fn build_values(
    options: &InstallOptions,
    config: &Config,
    identity: &IdentityMaterial,
) -> Result<InstallValues> {
    let controller_log_level: ControllerLogLevel = options.controller_log_level.parse()?;
    let identity_context = &config.global.identity_context;

    Ok(InstallValues {
        namespace: config.global.namespace.clone(),
        controller_image: options.image_ref("controller"),
        web_image: options.image_ref("web"),
        prometheus_image: defaults::PROMETHEUS_IMAGE.to_string(),
        grafana_image: options.image_ref("grafana"),
        controller_replicas: options
            .controller_replicas
            .unwrap_or(defaults::CONTROLLER_REPLICAS),
        image_pull_policy: config.proxy.proxy_image.pull_policy.to_string(),
        uuid: config.install.uuid.clone(),
        cli_version: config.install.cli_version.clone(),
        controller_log_level: controller_log_level.to_string(),
        prometheus_log_level: controller_log_level.prometheus_level().to_string(),
        controller_component_label: CONTROLLER_COMPONENT_LABEL.to_string(),
        created_by_annotation: CREATED_BY_ANNOTATION.to_string(),
        proxy_container_name: PROXY_CONTAINER_NAME.to_string(),
        proxy_auto_inject_enabled: options.proxy_auto_inject,
        proxy_inject_annotation: PROXY_INJECT_ANNOTATION.to_string(),
        proxy_inject_disabled: PROXY_INJECT_DISABLED.to_string(),
        controller_uid: options.controller_uid,
        enable_h2_upgrade: !options.disable_h2_upgrade,
        no_init_container: options.no_init_container,
        single_namespace: options.single_namespace,
        enable_ha: options.high_availability,
        controller_cpu_request: options.controller_cpu_request.clone(),
        controller_memory_request: options.controller_memory_request.clone(),
        global_config: section_json("global", &config.global)?,
        proxy_config: section_json("proxy", &config.proxy)?,
        install_config: section_json("install", &config.install)?,
        identity: IdentityValues {
            trust_domain: identity_context.trust_domain.clone(),
            trust_anchors_pem: identity_context.trust_anchors_pem.clone(),
            issuer: IssuerValues {
                crt_pem: identity.issuer_crt_pem.clone(),
                key_pem: identity.issuer_key_pem.clone(),
                issuance_lifetime: humantime::format_duration(identity_context.issuance_lifetime)
                    .to_string(),
                clock_skew_allowance: humantime::format_duration(
                    identity_context.clock_skew_allowance,
                )
                .to_string(),
            },
        },
    })
}

fn parse_duration(flag: &'static str, value: &str) -> std::result::Result<Duration, ValidationError> {
    humantime::parse_duration(value).map_err(|_| ValidationError::Duration {
        flag,
        value: value.to_string(),
    })
}

fn section_json<T: serde::Serialize>(section: &'static str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        CoreError::from(BuildError::Serialize {
            section,
            message: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticCredentials;
    use std::path::PathBuf;

    const UUID: &str = "deaab91a-f4ab-448a-b7d1-c832a2fa0a60";

    fn credentials() -> StaticCredentials {
        StaticCredentials::new()
            .with("testdata/trust-anchors.pem", "ANCHORS\n")
            .with("testdata/crt.pem", "CRT\n")
            .with("testdata/key.pem", "KEY\n")
    }

    fn test_install_options() -> InstallOptions {
        let mut options = InstallOptions::new();
        options.version = "dev-undefined".to_string();
        options.install_uuid = Some(UUID.to_string());
        options.identity.trust_anchors_file = Some(PathBuf::from("testdata/trust-anchors.pem"));
        options.identity.issuer_certificate_file = Some(PathBuf::from("testdata/crt.pem"));
        options.identity.issuer_key_file = Some(PathBuf::from("testdata/key.pem"));
        options
    }

    #[test]
    fn test_build_applies_defaults() {
        let (values, config) = build(&test_install_options(), &credentials()).unwrap();

        assert_eq!(values.namespace, "meshctl");
        assert_eq!(values.controller_replicas, 1);
        assert_eq!(values.controller_log_level, "info");
        assert_eq!(values.prometheus_log_level, "info");
        assert_eq!(values.image_pull_policy, "IfNotPresent");
        assert_eq!(values.controller_image, "ghcr.io/meshctl/controller:dev-undefined");
        assert_eq!(values.prometheus_image, "prom/prometheus:v2.11.1");
        assert_eq!(values.cli_version, "meshctl/cli dev-undefined");
        assert_eq!(values.uuid, UUID);
        assert_eq!(values.identity.issuer.issuance_lifetime, "1day");
        assert_eq!(values.identity.issuer.clock_skew_allowance, "20s");
        assert!(values.enable_h2_upgrade);
        assert_eq!(values.controller_cpu_request, None);

        assert_eq!(config.global().namespace(), "meshctl");
        assert_eq!(config.proxy.log_level.as_str(), "warn,mesh_proxy=info");
        assert_eq!(config.proxy.proxy_image.image_name, "ghcr.io/meshctl/proxy");
        assert_eq!(config.proxy.resource, ResourceRequirements::default());
        assert!(config.proxy.disable_external_profiles);
        assert_eq!(config.global.identity_context.trust_anchors_pem, "ANCHORS\n");
    }

    #[test]
    fn test_build_renders_config_sections_into_values() {
        let (values, config) = build(&test_install_options(), &credentials()).unwrap();

        insta::assert_snapshot!(values.install_config, @r#"{"uuid":"deaab91a-f4ab-448a-b7d1-c832a2fa0a60","cliVersion":"meshctl/cli dev-undefined","highAvailability":false}"#);
        assert_eq!(
            values.proxy_config,
            serde_json::to_string(&config.proxy).unwrap()
        );
    }

    #[test]
    fn test_build_is_idempotent_with_explicit_uuid() {
        let options = test_install_options();
        let first = build(&options, &credentials()).unwrap();
        let second = build(&options, &credentials()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_generates_uuid_when_absent() {
        let mut options = test_install_options();
        options.install_uuid = None;

        let (first, first_config) = build(&options, &credentials()).unwrap();
        let (second, _) = build(&options, &credentials()).unwrap();

        assert!(uuid::Uuid::parse_str(&first.uuid).is_ok());
        assert_ne!(first.uuid, second.uuid);
        assert_eq!(first.uuid, first_config.install.uuid);
    }

    #[test]
    fn test_high_availability_preset() {
        let mut options = test_install_options();
        options.high_availability = true;

        let (values, config) = build(&options, &credentials()).unwrap();

        assert_eq!(values.controller_replicas, 3);
        assert!(values.enable_ha);
        assert_eq!(values.controller_cpu_request.as_deref(), Some("100m"));
        assert_eq!(values.controller_memory_request.as_deref(), Some("50Mi"));
        assert_eq!(
            config.proxy.resource.request_cpu.as_ref().map(|q| q.as_str()),
            Some("100m")
        );
        assert!(config.install.high_availability);
        // the caller's options are a snapshot and stay untouched
        assert_eq!(options.controller_replicas, None);
    }

    #[test]
    fn test_explicit_values_beat_high_availability_preset() {
        let mut options = test_install_options();
        options.high_availability = true;
        options.controller_replicas = Some(2);
        options.proxy.cpu_request = Some("400m".to_string());
        options.proxy.memory_request = Some("300Mi".to_string());

        let (values, config) = build(&options, &credentials()).unwrap();

        assert_eq!(values.controller_replicas, 2);
        let resource = &config.proxy.resource;
        assert_eq!(resource.request_cpu.as_ref().map(|q| q.as_str()), Some("400m"));
        assert_eq!(
            resource.request_memory.as_ref().map(|q| q.as_str()),
            Some("300Mi")
        );
    }

    #[test]
    fn test_validation_runs_before_anything_else() {
        let mut options = test_install_options();
        options.controller_log_level = "super".to_string();

        // no credentials at all: a validation error must win
        let err = build(&options, &StaticCredentials::new()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ControllerLogLevel { .. })
        ));
    }

    #[test]
    fn test_missing_credentials_fail_the_build() {
        let err = build(&test_install_options(), &StaticCredentials::new()).unwrap_err();
        assert!(matches!(err, CoreError::Credentials { .. }));
    }

    #[test]
    fn test_no_init_container_with_auto_inject() {
        let mut options = test_install_options();
        options.no_init_container = true;
        options.proxy_auto_inject = true;

        let (values, config) = build(&options, &credentials()).unwrap();

        assert!(values.no_init_container);
        assert!(values.proxy_auto_inject_enabled);
        assert!(config.global.cni_enabled);
    }

    #[test]
    fn test_fatal_controller_level_maps_for_prometheus() {
        let mut options = test_install_options();
        options.controller_log_level = "fatal".to_string();

        let (values, _) = build(&options, &credentials()).unwrap();
        assert_eq!(values.controller_log_level, "fatal");
        assert_eq!(values.prometheus_log_level, "error");
    }

    #[test]
    fn test_custom_proxy_images() {
        let mut options = test_install_options();
        options.proxy.image = Some("example.com/proxy".to_string());
        options.image_pull_policy = "Always".to_string();

        let (_, config) = build(&options, &credentials()).unwrap();
        assert_eq!(config.proxy.proxy_image.image_name, "example.com/proxy");
        assert_eq!(config.proxy.proxy_image.pull_policy, PullPolicy::Always);
        assert_eq!(
            config.proxy.proxy_init_image.image_name,
            "ghcr.io/meshctl/proxy-init"
        );
    }
}
