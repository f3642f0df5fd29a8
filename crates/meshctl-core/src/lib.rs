//! meshctl Core - install options, validation and the canonical configuration
//!
//! This crate turns what an operator asked for into what gets rendered:
//! - `InstallOptions`: raw options, with options-file layering
//! - `validate`: the validation contract for every option
//! - `build`: options → canonical [`Config`] + render-ready [`InstallValues`]
//! - `IdentityMaterial`: issuer material read through a [`CredentialSource`]

pub mod builder;
pub mod config;
pub mod error;
pub mod identity;
pub mod layers;
pub mod log_level;
pub mod options;
pub mod preset;
pub mod quantity;
pub mod validate;
pub mod values;

pub use builder::{build, build_config};
pub use config::{Config, GlobalConfig, IdentityContext, InstallConfig, ProxyConfig, PullPolicy};
pub use error::{BuildError, CoreError, Result, ValidationError};
pub use identity::{CredentialSource, FsCredentials, IdentityMaterial, StaticCredentials};
pub use layers::OptionsLayers;
pub use log_level::{ControllerLogLevel, ProxyLogFilter};
pub use options::{IdentityOptions, InstallOptions, ProxyOptions};
pub use preset::Preset;
pub use quantity::Quantity;
pub use values::InstallValues;

/// Version of this meshctl build, used as the default control-plane version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
