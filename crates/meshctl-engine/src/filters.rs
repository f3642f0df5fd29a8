//! Manifest-oriented template filters
//!
//! Registered on every environment the engine builds, next to the
//! MiniJinja builtins.

use minijinja::value::ValueKind;
use minijinja::{Error, ErrorKind, Output, State, Value};

/// Print `{{ }}` expressions, with booleans spelled the YAML way
///
/// MiniJinja prints booleans as `True`/`False`, which flag arguments such
/// as `-single-namespace={{ values.single_namespace }}` would pass on.
pub fn format_value(out: &mut Output, state: &State, value: &Value) -> Result<(), Error> {
    if value.kind() == ValueKind::Bool {
        out.write_str(if value.is_true() { "true" } else { "false" })?;
        return Ok(());
    }
    minijinja::escape_formatter(out, state, value)
}

/// Convert a value to YAML
///
/// Usage: {{ values.identity | toyaml }}
pub fn toyaml(value: Value) -> Result<String, Error> {
    let json_value: serde_json::Value = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    let yaml = serde_yaml::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    Ok(yaml.trim_start_matches("---\n").trim_end().to_string())
}

/// Convert a value to compact JSON
///
/// Usage: {{ config.proxy | tojson }}
pub fn tojson(value: Value) -> Result<String, Error> {
    let json_value: serde_json::Value = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    serde_json::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Wrap a value in double quotes, escaping backslashes and quotes
#[must_use]
pub fn quote(value: Value) -> String {
    let s = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Indent every line and start on a fresh line
///
/// Usage: `crt.pem: |{{ values.identity.issuer.crt_pem | nindent(4) }}`
#[must_use]
pub fn nindent(value: String, spaces: usize) -> String {
    format!("\n{}", indent(value, spaces))
}

/// Indent every non-empty line
#[must_use]
pub fn indent(value: String, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    value
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fail the render when a value is missing or empty
///
/// Usage: {{ values.uuid | required("install uuid is required") }}
pub fn required(value: Value, message: Option<String>) -> Result<Value, Error> {
    let missing = value.is_undefined()
        || value.is_none()
        || value.as_str().is_some_and(str::is_empty);

    if missing {
        let msg = message.unwrap_or_else(|| "required value is missing".to_string());
        Err(Error::new(ErrorKind::InvalidOperation, msg))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_print_lowercase() {
        let mut env = minijinja::Environment::new();
        env.set_formatter(format_value);
        let out = env
            .render_str(
                "-single-namespace={{ off }} -no-init-container={{ on }} {{ n }} {{ s }}",
                minijinja::context! { off => false, on => true, n => 4143, s => "True" },
            )
            .unwrap();
        assert_eq!(out, "-single-namespace=false -no-init-container=true 4143 True");
    }

    #[test]
    fn test_nindent_pem() {
        let pem = "-----BEGIN-----\nABC\n-----END-----\n".to_string();
        assert_eq!(
            nindent(pem, 4),
            "\n    -----BEGIN-----\n    ABC\n    -----END-----"
        );
    }

    #[test]
    fn test_indent_keeps_blank_lines_empty() {
        assert_eq!(indent("a\n\nb".to_string(), 2), "  a\n\n  b");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(Value::from("meshctl/cli v1")), "\"meshctl/cli v1\"");
        assert_eq!(quote(Value::from("say \"hi\"")), "\"say \\\"hi\\\"\"");
        assert_eq!(quote(Value::from(3)), "\"3\"");
    }

    #[test]
    fn test_required() {
        assert!(required(Value::from("x"), None).is_ok());
        assert!(required(Value::from(""), None).is_err());
        assert!(required(Value::from(()), Some("uuid".to_string())).is_err());
        assert!(required(Value::UNDEFINED, None).is_err());
    }

    #[test]
    fn test_toyaml_and_tojson() {
        let value = Value::from_serialize(serde_json::json!({"requestCpu": "100m"}));
        assert_eq!(toyaml(value.clone()).unwrap(), "requestCpu: 100m");
        assert_eq!(tojson(value).unwrap(), r#"{"requestCpu":"100m"}"#);
    }
}
