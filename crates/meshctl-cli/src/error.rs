//! CLI error type with exit code handling

use meshctl_core::CoreError;
use meshctl_engine::RenderError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI error type that carries its exit code
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Options were rejected
    #[error("Validation failed: {message}")]
    #[diagnostic(code(meshctl::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template rendering failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),

    /// Valid options could not be turned into a configuration
    #[error("Build failed: {message}")]
    #[diagnostic(code(meshctl::cli::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(meshctl::cli::io))]
    Io { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Render(RenderError::Io(_) | RenderError::Load { .. }) => exit_codes::IO_ERROR,
            CliError::Render(_) => exit_codes::RENDER_ERROR,
            CliError::Build { .. } => exit_codes::BUILD_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => CliError::validation(e.to_string()),
            err @ (CoreError::OptionsFile { .. } | CoreError::YamlParse(_)) => {
                CliError::validation_with_help(
                    err.to_string(),
                    "options files use the camelCase option names, e.g. controllerReplicas",
                )
            }
            err @ CoreError::Credentials { .. } => CliError::Io {
                message: err.to_string(),
            },
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            err @ CoreError::InvalidCredentials { .. } => CliError::Build {
                message: err.to_string(),
                help: Some("pass PEM files produced by your certificate tooling".to_string()),
            },
            other => CliError::Build {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
