//! Probe command - identify a single java executable

use anyhow::{Context, Result};

use crate::cli::{Cli, ProbeArgs};
use crate::context::App;

pub fn run(args: &ProbeArgs, cli: &Cli) -> Result<()> {
    let app = App::new(cli)?;
    let info = app
        .context
        .prober
        .identify(&args.executable, !args.slow)
        .with_context(|| format!("failed to identify {}", args.executable.display()))?;

    println!("platform: {}", info.platform);
    println!("version:  {}", info.version);
    println!("vendor:   {}", info.vendor.as_deref().unwrap_or("-"));
    Ok(())
}
