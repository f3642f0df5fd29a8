//! Canonical, versioned install configuration
//!
//! A [`Config`] is derived from validated options and is complete by
//! construction. It serializes to camelCase JSON, which is how it is
//! stored in the control plane's config map.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::log_level::ProxyLogFilter;
use crate::quantity::Quantity;

/// Image pull policy for every control-plane container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Always" => Ok(Self::Always),
            "IfNotPresent" => Ok(Self::IfNotPresent),
            "Never" => Ok(Self::Never),
            other => Err(ValidationError::ImagePullPolicy {
                value: other.to_string(),
            }),
        }
    }
}

/// The full install configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub global: GlobalConfig,
    pub proxy: ProxyConfig,
    pub install: InstallConfig,
}

impl Config {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    pub fn install(&self) -> &InstallConfig {
        &self.install
    }

    /// Parse a configuration previously written with [`Config::to_json`]
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Settings shared by every control-plane component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub namespace: String,
    pub cni_enabled: bool,
    pub version: String,
    pub identity_context: IdentityContext,
}

impl GlobalConfig {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityContext {
    pub trust_domain: String,
    pub trust_anchors_pem: String,
    #[serde(with = "humantime_serde")]
    pub issuance_lifetime: Duration,
    #[serde(with = "humantime_serde")]
    pub clock_skew_allowance: Duration,
}

/// Defaults applied to every injected proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub proxy_image: Image,
    pub proxy_init_image: Image,
    pub control_port: u16,
    pub ignore_inbound_ports: Vec<u16>,
    pub ignore_outbound_ports: Vec<u16>,
    pub inbound_port: u16,
    pub admin_port: u16,
    pub outbound_port: u16,
    pub resource: ResourceRequirements,
    pub proxy_uid: i64,
    pub log_level: ProxyLogFilter,
    pub disable_external_profiles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub image_name: String,
    pub pull_policy: PullPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_cpu: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_memory: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_cpu: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_memory: Option<Quantity>,
}

/// Facts about this particular install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    pub uuid: String,
    pub cli_version: String,
    pub high_availability: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            global: GlobalConfig {
                namespace: "meshctl".to_string(),
                cni_enabled: false,
                version: "v1".to_string(),
                identity_context: IdentityContext {
                    trust_domain: "cluster.local".to_string(),
                    trust_anchors_pem: "PEM\n".to_string(),
                    issuance_lifetime: Duration::from_secs(24 * 60 * 60),
                    clock_skew_allowance: Duration::from_secs(20),
                },
            },
            proxy: ProxyConfig {
                proxy_image: Image {
                    image_name: "ghcr.io/meshctl/proxy".to_string(),
                    pull_policy: PullPolicy::IfNotPresent,
                },
                proxy_init_image: Image {
                    image_name: "ghcr.io/meshctl/proxy-init".to_string(),
                    pull_policy: PullPolicy::IfNotPresent,
                },
                control_port: 4190,
                ignore_inbound_ports: vec![],
                ignore_outbound_ports: vec![25],
                inbound_port: 4143,
                admin_port: 4191,
                outbound_port: 4140,
                resource: ResourceRequirements {
                    request_cpu: Some(Quantity::parse("100m").unwrap()),
                    ..Default::default()
                },
                proxy_uid: 2102,
                log_level: "warn".parse().unwrap(),
                disable_external_profiles: true,
            },
            install: InstallConfig {
                uuid: "deaab91a-f4ab-448a-b7d1-c832a2fa0a60".to_string(),
                cli_version: "meshctl/cli v1".to_string(),
                high_availability: false,
            },
        }
    }

    #[test]
    fn test_pull_policy_parse() {
        assert_eq!("Always".parse::<PullPolicy>(), Ok(PullPolicy::Always));
        let err = "always".parse::<PullPolicy>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "--image-pull-policy must be one of: Always, IfNotPresent, Never"
        );
    }

    #[test]
    fn test_namespace_accessor() {
        assert_eq!(sample().global().namespace(), "meshctl");
    }

    #[test]
    fn test_json_roundtrip() {
        let config = sample();
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_global_section_json() {
        let json = serde_json::to_string(&sample().global).unwrap();
        insta::assert_snapshot!(json, @r#"{"namespace":"meshctl","cniEnabled":false,"version":"v1","identityContext":{"trustDomain":"cluster.local","trustAnchorsPem":"PEM\n","issuanceLifetime":"1day","clockSkewAllowance":"20s"}}"#);
    }

    #[test]
    fn test_unset_resources_are_omitted() {
        let json = serde_json::to_string(&ResourceRequirements::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
