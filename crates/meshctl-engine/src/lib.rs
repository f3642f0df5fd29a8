//! meshctl Engine - renders control-plane manifests
//!
//! This crate provides a MiniJinja-based renderer with:
//! - The built-in control-plane template set, emitted in a fixed order
//! - Strict undefined handling: a missing value fails the whole render
//! - Source-mapped template errors with suggestions

pub mod engine;
pub mod error;
pub mod filters;
pub mod suggestions;

pub use engine::{Engine, EngineBuilder, SOURCE_PREFIX};
pub use error::{RenderError, Result, TemplateError, TemplateErrorKind};
pub use suggestions::AVAILABLE_FILTERS;
