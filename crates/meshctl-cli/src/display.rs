//! Display formatting for validation results

use console::style;

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Everything found wrong with one set of install options
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>, suggestion: Option<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            message: message.into(),
            suggestion,
        });
    }

    pub fn add_warning(&mut self, message: impl Into<String>, suggestion: Option<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
            suggestion,
        });
    }

    /// Print each issue with its hint, errors first
    pub fn display(&self) {
        let mut issues: Vec<&ValidationIssue> = self.issues.iter().collect();
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));

        for issue in issues {
            let icon = match issue.severity {
                Severity::Error => style("✗").red(),
                Severity::Warning => style("⚠").yellow(),
            };
            println!("  {} {}", icon, issue.message);

            if let Some(suggestion) = &issue.suggestion {
                println!("    {} {}", style("hint:").blue(), suggestion);
            }
        }
    }

    /// (errors, warnings)
    pub fn summary(&self) -> (usize, usize) {
        let errors = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        (errors, self.issues.len() - errors)
    }

    pub fn print_summary(&self) {
        let (errors, warnings) = self.summary();
        if errors > 0 {
            println!(
                "{} Validation failed: {}, {}",
                style("✗").red().bold(),
                pluralize(errors, "error", "errors"),
                pluralize(warnings, "warning", "warnings")
            );
        } else if warnings > 0 {
            println!(
                "{} Options are valid with {}",
                style("⚠").yellow().bold(),
                pluralize(warnings, "warning", "warnings")
            );
        } else {
            println!("{} Options are valid", style("✓").green().bold());
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut report = ValidationReport::new();
        report.add_warning("replicas", None);
        assert!(!report.has_errors());

        report.add_error("bad level", Some("use info".to_string()));
        report.add_error("bad port", None);
        assert!(report.has_errors());
        assert_eq!(report.summary(), (2, 1));
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "error", "errors"), "1 error");
        assert_eq!(pluralize(0, "error", "errors"), "0 errors");
    }
}
