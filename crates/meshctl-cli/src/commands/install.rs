//! Install command - render the control-plane manifests to stdout

use std::io;
use std::path::Path;

use meshctl_core::FsCredentials;
use meshctl_engine::Engine;

use super::InstallArgs;
use crate::error::Result;

pub fn run(args: &InstallArgs, templates: Option<&Path>) -> Result<()> {
    let options = args.options()?;
    let (values, config) = meshctl_core::build(&options, &FsCredentials)?;

    let engine = match templates {
        Some(dir) => Engine::from_dir(dir)?,
        None => Engine::new(),
    };

    // nothing reaches stdout unless every manifest rendered
    engine.render(&values, &config, &mut io::stdout().lock())?;

    tracing::info!(
        namespace = %values.namespace,
        uuid = %values.uuid,
        "rendered control-plane manifests"
    );
    Ok(())
}
