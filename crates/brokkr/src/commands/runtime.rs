//! Add and remove commands - manage the user's runtime list

use anyhow::{Context, Result};
use brokkr_java::JavaRegistry;

use crate::cli::{AddArgs, Cli, RemoveArgs};
use crate::context::App;

pub async fn add(args: &AddArgs, cli: &Cli) -> Result<()> {
    let App {
        context,
        mut config,
        config_path,
    } = App::new(cli)?;
    let registry = JavaRegistry::new(context);
    registry.initialize();

    let runtime = registry
        .add_executable(&args.executable)
        .await
        .with_context(|| format!("cannot register {}", args.executable.display()))?;

    config.add(runtime.binary().to_path_buf());
    config
        .save(&config_path)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!(
        "registered {} ({}, {})",
        runtime.binary().display(),
        runtime.version(),
        runtime.platform()
    );
    Ok(())
}

pub fn remove(args: &RemoveArgs, cli: &Cli) -> Result<()> {
    let mut app = App::new(cli)?;
    app.config.remove(&args.executable);
    app.save_config()?;

    println!("removed {}", args.executable.display());
    Ok(())
}
