//! Log level types for control-plane components
//!
//! Both levels arrive as free text on the command line and are parsed once
//! at the boundary; everything downstream works with these types.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Log level accepted by the controller components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ControllerLogLevel {
    Panic,
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl ControllerLogLevel {
    pub const ALL: [ControllerLogLevel; 6] = [
        Self::Panic,
        Self::Fatal,
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Panic => "panic",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Equivalent level for the bundled Prometheus, which has no panic or fatal
    pub fn prometheus_level(&self) -> &'static str {
        match self {
            Self::Panic | Self::Fatal | Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for ControllerLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControllerLogLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ValidationError::ControllerLogLevel {
                value: s.to_string(),
            })
    }
}

/// Verbosity accepted in a proxy log directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl ProxyLevel {
    /// Parse a level name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One `module[=level]` or bare-level entry of a proxy log filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDirective {
    /// A bare level applying to every module
    Level(ProxyLevel),
    /// A module path, optionally with its own level
    Module {
        module: String,
        level: Option<ProxyLevel>,
    },
}

static MODULE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_:]+$").expect("valid regex"));

fn parse_directive(directive: &str) -> Option<LogDirective> {
    match directive.split_once('=') {
        Some((module, level)) => {
            if !MODULE_PATH.is_match(module) {
                return None;
            }
            let level = ProxyLevel::parse(level)?;
            Some(LogDirective::Module {
                module: module.to_string(),
                level: Some(level),
            })
        }
        None => {
            if let Some(level) = ProxyLevel::parse(directive) {
                return Some(LogDirective::Level(level));
            }
            MODULE_PATH.is_match(directive).then(|| LogDirective::Module {
                module: directive.to_string(),
                level: None,
            })
        }
    }
}

/// A validated proxy log filter such as `warn,mesh_proxy=info`
///
/// The filter text is kept verbatim; the proxy parses it again itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyLogFilter {
    raw: String,
    directives: Vec<LogDirective>,
}

impl ProxyLogFilter {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn directives(&self) -> &[LogDirective] {
        &self.directives
    }

    /// Level for modules no directive names; the last bare level wins
    ///
    /// `None` means unlisted modules do not log at all.
    pub fn default_level(&self) -> Option<ProxyLevel> {
        self.directives().iter().rev().find_map(|d| match d {
            LogDirective::Level(level) => Some(*level),
            LogDirective::Module { .. } => None,
        })
    }
}

impl FromStr for ProxyLogFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::ProxyLogLevel {
            value: s.to_string(),
        };

        if s.is_empty() {
            return Err(invalid());
        }

        let directives = s
            .split(',')
            .map(parse_directive)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;

        Ok(Self {
            raw: s.to_string(),
            directives,
        })
    }
}

impl fmt::Display for ProxyLogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ProxyLogFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ProxyLogFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_levels_roundtrip_through_text() {
        for level in ControllerLogLevel::ALL {
            assert_eq!(level.as_str().parse::<ControllerLogLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_controller_level_is_case_sensitive() {
        assert!("INFO".parse::<ControllerLogLevel>().is_err());
        assert!("super".parse::<ControllerLogLevel>().is_err());
    }

    #[test]
    fn test_prometheus_level_mapping() {
        assert_eq!(ControllerLogLevel::Panic.prometheus_level(), "error");
        assert_eq!(ControllerLogLevel::Fatal.prometheus_level(), "error");
        assert_eq!(ControllerLogLevel::Warn.prometheus_level(), "warn");
        assert_eq!(ControllerLogLevel::Debug.prometheus_level(), "debug");
    }

    #[test]
    fn test_proxy_filter_grammar() {
        let cases = [
            ("", false),
            ("info", true),
            ("INFO", true),
            ("somemodule", true),
            ("bad%name", false),
            ("linkerd2_proxy=debug", true),
            ("linkerd2_proxy=DEBUG", true),
            ("linkerd2%proxy=debug", false),
            ("linkerd2_proxy=foobar", false),
            ("linker2d_proxy,std::option", true),
            ("warn,linkerd2_proxy=info", true),
            ("warn,linkerd2_proxy=foobar", false),
            ("warn,", false),
            (",warn", false),
            ("=info", false),
            ("module=", false),
        ];

        for (input, valid) in cases {
            let result = input.parse::<ProxyLogFilter>();
            assert_eq!(result.is_ok(), valid, "input {:?}", input);
            if let Err(err) = result {
                assert!(err.to_string().contains(&format!("\"{}\"", input)));
            }
        }
    }

    #[test]
    fn test_proxy_filter_directives() {
        let filter: ProxyLogFilter = "warn,mesh_proxy=debug,std::io".parse().unwrap();

        assert_eq!(
            filter.directives(),
            &[
                LogDirective::Level(ProxyLevel::Warn),
                LogDirective::Module {
                    module: "mesh_proxy".to_string(),
                    level: Some(ProxyLevel::Debug),
                },
                LogDirective::Module {
                    module: "std::io".to_string(),
                    level: None,
                },
            ]
        );
        assert_eq!(filter.to_string(), "warn,mesh_proxy=debug,std::io");
        assert_eq!(filter.default_level(), Some(ProxyLevel::Warn));
    }

    #[test]
    fn test_proxy_filter_default_level() {
        let last_wins: ProxyLogFilter = "warn,mesh_proxy=debug,error".parse().unwrap();
        assert_eq!(last_wins.default_level(), Some(ProxyLevel::Error));

        let modules_only: ProxyLogFilter = "mesh_proxy=debug,std::io".parse().unwrap();
        assert_eq!(modules_only.default_level(), None);
    }
}
