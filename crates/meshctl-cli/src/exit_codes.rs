//! Exit codes for CLI operations
//!
//! Codes 2-5 tell scripts which pipeline stage failed.

/// Validation error - an option value or combination was rejected
pub const VALIDATION_ERROR: i32 = 2;

/// Render error - a template failed or render inputs were inconsistent
pub const RENDER_ERROR: i32 = 3;

/// Build error - options validated but could not become a configuration
pub const BUILD_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
