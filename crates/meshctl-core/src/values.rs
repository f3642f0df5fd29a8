//! Render-ready install values
//!
//! [`InstallValues`] is the flat projection of a [`crate::Config`] plus the
//! computed fields templates need (image references, label keys, the
//! install UUID). Field names are what templates see under `values`.

use serde::{Deserialize, Serialize};

/// Label key identifying which control-plane component owns a resource
pub const CONTROLLER_COMPONENT_LABEL: &str = "meshctl.io/control-plane-component";

/// Annotation recording which CLI produced a resource
pub const CREATED_BY_ANNOTATION: &str = "meshctl.io/created-by";

/// Annotation controlling proxy injection
pub const PROXY_INJECT_ANNOTATION: &str = "meshctl.io/inject";

/// Value of [`PROXY_INJECT_ANNOTATION`] that opts a workload out
pub const PROXY_INJECT_DISABLED: &str = "disabled";

pub const PROXY_CONTAINER_NAME: &str = "meshctl-proxy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallValues {
    pub namespace: String,
    pub controller_image: String,
    pub web_image: String,
    pub prometheus_image: String,
    pub grafana_image: String,
    pub controller_replicas: u32,
    pub image_pull_policy: String,
    pub uuid: String,
    pub cli_version: String,
    pub controller_log_level: String,
    pub prometheus_log_level: String,
    pub controller_component_label: String,
    pub created_by_annotation: String,
    pub proxy_container_name: String,
    pub proxy_auto_inject_enabled: bool,
    pub proxy_inject_annotation: String,
    pub proxy_inject_disabled: String,
    pub controller_uid: i64,
    pub enable_h2_upgrade: bool,
    pub no_init_container: bool,
    pub single_namespace: bool,
    pub enable_ha: bool,
    pub controller_cpu_request: Option<String>,
    pub controller_memory_request: Option<String>,

    /// JSON rendering of the global config section
    pub global_config: String,
    /// JSON rendering of the proxy config section
    pub proxy_config: String,
    /// JSON rendering of the install config section
    pub install_config: String,

    pub identity: IdentityValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityValues {
    pub trust_domain: String,
    pub trust_anchors_pem: String,
    pub issuer: IssuerValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerValues {
    pub crt_pem: String,
    pub key_pem: String,
    pub issuance_lifetime: String,
    pub clock_skew_allowance: String,
}

impl InstallValues {
    /// First field a template would dereference that is empty or zero
    ///
    /// Optional resource requests are not required; every other field is.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        let required: &[(&'static str, &str)] = &[
            ("namespace", self.namespace.as_str()),
            ("controller_image", self.controller_image.as_str()),
            ("web_image", self.web_image.as_str()),
            ("prometheus_image", self.prometheus_image.as_str()),
            ("grafana_image", self.grafana_image.as_str()),
            ("image_pull_policy", self.image_pull_policy.as_str()),
            ("uuid", self.uuid.as_str()),
            ("cli_version", self.cli_version.as_str()),
            ("controller_log_level", self.controller_log_level.as_str()),
            ("prometheus_log_level", self.prometheus_log_level.as_str()),
            ("controller_component_label", self.controller_component_label.as_str()),
            ("created_by_annotation", self.created_by_annotation.as_str()),
            ("proxy_container_name", self.proxy_container_name.as_str()),
            ("proxy_inject_annotation", self.proxy_inject_annotation.as_str()),
            ("proxy_inject_disabled", self.proxy_inject_disabled.as_str()),
            ("global_config", self.global_config.as_str()),
            ("proxy_config", self.proxy_config.as_str()),
            ("install_config", self.install_config.as_str()),
            ("identity.trust_domain", self.identity.trust_domain.as_str()),
            ("identity.trust_anchors_pem", self.identity.trust_anchors_pem.as_str()),
            ("identity.issuer.crt_pem", self.identity.issuer.crt_pem.as_str()),
            ("identity.issuer.key_pem", self.identity.issuer.key_pem.as_str()),
            (
                "identity.issuer.issuance_lifetime",
                self.identity.issuer.issuance_lifetime.as_str(),
            ),
            (
                "identity.issuer.clock_skew_allowance",
                self.identity.issuer.clock_skew_allowance.as_str(),
            ),
        ];

        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Some(*field);
        }
        if self.controller_replicas == 0 {
            return Some("controller_replicas");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> InstallValues {
        InstallValues {
            namespace: "ns".to_string(),
            controller_image: "c".to_string(),
            web_image: "w".to_string(),
            prometheus_image: "p".to_string(),
            grafana_image: "g".to_string(),
            controller_replicas: 1,
            image_pull_policy: "Always".to_string(),
            uuid: "u".to_string(),
            cli_version: "v".to_string(),
            controller_log_level: "info".to_string(),
            prometheus_log_level: "info".to_string(),
            controller_component_label: "l".to_string(),
            created_by_annotation: "a".to_string(),
            proxy_container_name: "proxy".to_string(),
            proxy_auto_inject_enabled: false,
            proxy_inject_annotation: "i".to_string(),
            proxy_inject_disabled: "d".to_string(),
            controller_uid: 2103,
            enable_h2_upgrade: true,
            no_init_container: false,
            single_namespace: false,
            enable_ha: false,
            controller_cpu_request: None,
            controller_memory_request: None,
            global_config: "{}".to_string(),
            proxy_config: "{}".to_string(),
            install_config: "{}".to_string(),
            identity: IdentityValues {
                trust_domain: "cluster.local".to_string(),
                trust_anchors_pem: "anchors".to_string(),
                issuer: IssuerValues {
                    crt_pem: "crt".to_string(),
                    key_pem: "key".to_string(),
                    issuance_lifetime: "1day".to_string(),
                    clock_skew_allowance: "20s".to_string(),
                },
            },
        }
    }

    #[test]
    fn test_complete_values_have_no_missing_field() {
        assert_eq!(complete().first_missing_field(), None);
    }

    #[test]
    fn test_missing_string_field_is_reported() {
        let mut values = complete();
        values.web_image.clear();
        assert_eq!(values.first_missing_field(), Some("web_image"));

        let mut values = complete();
        values.identity.issuer.key_pem.clear();
        assert_eq!(values.first_missing_field(), Some("identity.issuer.key_pem"));
    }

    #[test]
    fn test_zero_replicas_is_missing() {
        let mut values = complete();
        values.controller_replicas = 0;
        assert_eq!(values.first_missing_field(), Some("controller_replicas"));
    }
}
