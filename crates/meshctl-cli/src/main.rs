//! meshctl - render service-mesh control-plane install manifests

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::InstallArgs;
use commands::config::OutputFormat;
use error::Result;

#[derive(Parser)]
#[command(name = "meshctl")]
#[command(version)]
#[command(about = "Render service-mesh control-plane install manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Log decisions made while building the configuration
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the control-plane manifests to stdout
    Install {
        #[command(flatten)]
        args: InstallArgs,

        /// Render from this template directory instead of the built-in set
        #[arg(long, value_name = "DIR")]
        templates: Option<PathBuf>,
    },

    /// Print the configuration an install would embed
    Config {
        #[command(flatten)]
        args: InstallArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },

    /// Check install options and report every problem
    Validate {
        #[command(flatten)]
        args: InstallArgs,
    },

    /// Print the meshctl version
    Version,
}

/// Logs go to stderr so stdout carries only manifests
///
/// `MESHCTL_LOG` takes an `EnvFilter` directive and overrides the flags.
fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env("MESHCTL_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(cli.debug)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install { args, templates } => {
            commands::install::run(&args, templates.as_deref())
        }
        Commands::Config { args, output } => commands::config::run(&args, output),
        Commands::Validate { args } => commands::validate::run(&args),
        Commands::Version => {
            println!("meshctl {}", meshctl_core::VERSION);
            Ok(())
        }
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
