//! Render errors with source-mapped diagnostics

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::suggestions::{suggest_undefined_variable, suggest_unknown_filter};

/// Everything that can stop a render
///
/// A render never writes partial output, so any of these means the sink
/// was left untouched.
#[derive(Error, Debug, Diagnostic)]
pub enum RenderError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error("install values are incomplete: `{field}` is empty")]
    #[diagnostic(
        code(meshctl::render::missing_value),
        help("install values must come from a successful build")
    )]
    MissingValue { field: &'static str },

    #[error("install values target namespace `{values}` but the configuration targets `{config}`")]
    #[diagnostic(code(meshctl::render::namespace_mismatch))]
    NamespaceMismatch { values: String, config: String },

    #[error("Failed to load templates from {path}: {source}")]
    #[diagnostic(code(meshctl::render::load))]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifests: {0}")]
    #[diagnostic(code(meshctl::render::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    SyntaxError,
    InvalidOperation,
    Other,
}

/// A template failure pointing at the offending line
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(meshctl::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Map a MiniJinja error onto the template it came from
    ///
    /// `context` is the serialized render context, used to suggest the
    /// closest existing key for an undefined one.
    pub fn from_minijinja(
        err: minijinja::Error,
        template_name: &str,
        template_source: &str,
        context: Option<&serde_json::Value>,
    ) -> Self {
        let detailed = format!("{err:#}");
        let kind = match err.kind() {
            minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
            minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
            minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
            minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
            _ => TemplateErrorKind::Other,
        };

        let expr = error_line(&detailed).and_then(|line| expression(line, kind));
        let message = match (kind, &expr) {
            (TemplateErrorKind::UndefinedVariable, Some(expr)) => {
                format!("undefined variable `{expr}`")
            }
            (TemplateErrorKind::UnknownFilter, Some(filter)) => format!("unknown filter `{filter}`"),
            _ => err
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
        };

        let suggestion = match (kind, &expr) {
            (TemplateErrorKind::UndefinedVariable, Some(expr)) => {
                suggest_undefined_variable(expr, context)
            }
            (TemplateErrorKind::UnknownFilter, Some(filter)) => Some(suggest_unknown_filter(filter)),
            (TemplateErrorKind::SyntaxError, _) => Some(
                "Check bracket matching: `{{ }}` for expressions, `{% %}` for statements"
                    .to_string(),
            ),
            _ => None,
        };

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span: err
                .line()
                .and_then(|line| line_span(template_source, line)),
            suggestion,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// The source line MiniJinja marks with `>` in its detailed display
///
/// The display looks like `   8 >   image: {{ values.controler_image }}`.
fn error_line(display: &str) -> Option<&str> {
    display.lines().find(|line| {
        let trimmed = line.trim_start();
        trimmed.contains(" > ") || trimmed.starts_with("> ")
    })
}

/// The undefined path or unknown filter inside the first `{{ }}` on a line
fn expression(line: &str, kind: TemplateErrorKind) -> Option<String> {
    let start = line.find("{{")? + 2;
    let end = start + line[start..].find("}}")?;
    let expr = &line[start..end];

    let name = match kind {
        TemplateErrorKind::UnknownFilter => expr.rsplit('|').next()?,
        _ => expr.split('|').next()?,
    };
    let name = name.trim().split(['(', ' ']).next()?.trim();

    (!name.is_empty()).then(|| name.to_string())
}

fn line_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;
    for (index, line) in source.lines().enumerate() {
        if index + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_extraction() {
        let line = "   8 >   image: {{ values.controler_image }}";
        assert_eq!(
            expression(line, TemplateErrorKind::UndefinedVariable).as_deref(),
            Some("values.controler_image")
        );

        let line = "   3 >   crt: {{ values.crt | nindnet(4) }}";
        assert_eq!(
            expression(line, TemplateErrorKind::UnknownFilter).as_deref(),
            Some("nindnet")
        );
    }

    #[test]
    fn test_error_line() {
        let display = "  1 |   kind: Secret\n  2 >   name: {{ values.nme }}\n    i   ^^^ undefined";
        assert_eq!(error_line(display), Some("  2 >   name: {{ values.nme }}"));
    }

    #[test]
    fn test_line_span() {
        let source = "kind: Secret\nname: x\n";
        let span = line_span(source, 2).unwrap();
        assert_eq!(span.offset(), 13);
        assert_eq!(span.len(), 7);
        assert!(line_span(source, 5).is_none());
    }

    #[test]
    fn test_missing_value_message() {
        let err = RenderError::MissingValue { field: "uuid" };
        assert_eq!(err.to_string(), "install values are incomplete: `uuid` is empty");
    }
}
