//! Validate command - report every problem with the install options

use console::style;
use meshctl_core::{InstallOptions, ProxyLogFilter, ValidationError};

use super::InstallArgs;
use crate::display::{ValidationReport, pluralize};
use crate::error::{CliError, Result};

pub fn run(args: &InstallArgs) -> Result<()> {
    println!("{} Validating install options", style("→").blue());

    let options = args.options()?;
    let report = check(&options);

    report.display();
    report.print_summary();

    if report.has_errors() {
        let (errors, _) = report.summary();
        return Err(CliError::validation(format!(
            "{} found",
            pluralize(errors, "problem", "problems")
        )));
    }
    Ok(())
}

/// Every rule violation, plus warnings for legal but risky combinations
fn check(options: &InstallOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    for error in options.validation_errors() {
        let hint = hint(&error).map(str::to_string);
        report.add_error(error.to_string(), hint);
    }

    if options.no_init_container && options.proxy_auto_inject {
        report.add_warning(
            "injected proxies will have no proxy-init container",
            Some("the CNI plugin must be installed on every node".to_string()),
        );
    }

    let module_only = options
        .proxy
        .log_level
        .parse::<ProxyLogFilter>()
        .ok()
        .filter(|filter| filter.default_level().is_none());
    if let Some(filter) = module_only {
        report.add_warning(
            format!("--proxy-log-level \"{filter}\" sets no default level"),
            Some("modules not named in the filter will not log; start it with a level, e.g. warn,mesh_proxy=debug".to_string()),
        );
    }

    if options.high_availability && options.controller_replicas == Some(1) {
        report.add_warning(
            "high availability requested with a single controller replica",
            Some("drop --controller-replicas to use the preset's replica count".to_string()),
        );
    }

    report
}

fn hint(error: &ValidationError) -> Option<&'static str> {
    match error {
        ValidationError::ProxyLogLevel { .. } => Some("for example: warn,mesh_proxy=info"),
        ValidationError::MutuallyExclusive { .. } => {
            Some("the proxy injector watches every namespace")
        }
        ValidationError::MissingIdentity { .. } => {
            Some("issue the trust anchors and issuer certificate with your own PKI")
        }
        ValidationError::PortConflict { .. } => Some("each proxy port needs its own listener"),
        _ => None,
    }
}
