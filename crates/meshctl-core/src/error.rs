//! Core error types

use std::path::PathBuf;

use thiserror::Error;

/// Reference for the proxy log filter syntax, quoted in error messages
pub const PROXY_LOG_SYNTAX_URL: &str =
    "https://docs.rs/env_logger/0.6.0/env_logger/#enabling-logging";

/// A problem with user-supplied install options
///
/// The display text is operator-facing and stable: it names the offending
/// flag and the accepted values or grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("--controller-log-level must be one of: panic, fatal, error, warn, info, debug")]
    ControllerLogLevel { value: String },

    #[error(
        "\"{value}\" is not a valid proxy log level - for allowed syntax check {url}",
        url = PROXY_LOG_SYNTAX_URL
    )]
    ProxyLogLevel { value: String },

    #[error("--image-pull-policy must be one of: Always, IfNotPresent, Never")]
    ImagePullPolicy { value: String },

    #[error("{flag} must be at least 1, got {value}")]
    ReplicaCount { flag: &'static str, value: u32 },

    #[error("{flag} must not be negative, got {value}")]
    NegativeUid { flag: &'static str, value: i64 },

    #[error("{flag} must be a valid resource quantity such as 100m or 64Mi: {reason}")]
    Quantity {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("{first} and {second} flags are mutually exclusive")]
    MutuallyExclusive {
        first: &'static str,
        second: &'static str,
    },

    #[error("--namespace must be a valid DNS-1123 label: \"{value}\"")]
    Namespace { value: String },

    #[error("{flag} must not be empty")]
    Empty { flag: &'static str },

    #[error("--identity-trust-domain must be a valid DNS name: \"{value}\"")]
    TrustDomain { value: String },

    #[error("{flag} must be a duration such as 24h or 20s: \"{value}\"")]
    Duration { flag: &'static str, value: String },

    #[error("{flag} must be supplied; identity material is not generated by the installer")]
    MissingIdentity { flag: &'static str },

    #[error("--install-uuid must be a valid UUID: \"{value}\"")]
    Uuid { value: String },

    #[error("{flag} must be a non-zero port")]
    Port { flag: &'static str },

    #[error("{first} and {second} must use different ports, both are {port}")]
    PortConflict {
        first: &'static str,
        second: &'static str,
        port: u16,
    },
}

/// Internal inconsistency in defaulting or preset logic
///
/// Valid options never produce one of these; seeing one is a bug in the
/// builder rather than a user error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("built configuration is incomplete: {field} is empty")]
    Incomplete { field: &'static str },

    #[error("failed to serialize {section} config: {message}")]
    Serialize {
        section: &'static str,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to read identity material from {path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Identity material in {path} is {problem}")]
    InvalidCredentials { path: PathBuf, problem: &'static str },

    #[error("Failed to parse options file: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid options file {path}: {source}")]
    OptionsFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
