//! Config command - print the canonical configuration

use clap::ValueEnum;
use meshctl_core::FsCredentials;

use super::InstallArgs;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

pub fn run(args: &InstallArgs, output: OutputFormat) -> Result<()> {
    let options = args.options()?;
    let (_, config) = meshctl_core::build(&options, &FsCredentials)?;

    let rendered = match output {
        OutputFormat::Yaml => config.to_yaml()?,
        OutputFormat::Json => config.to_json()?,
    };

    println!("{}", rendered.trim_end());
    Ok(())
}
