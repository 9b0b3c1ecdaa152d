//! Install and uninstall commands - managed store operations

use anyhow::{Context, Result};
use brokkr_core::Platform;
use serde_json::Map;

use crate::cli::{Cli, InstallArgs, UninstallArgs};
use crate::context::App;

pub async fn install(args: &InstallArgs, cli: &Cli) -> Result<()> {
    let app = App::new(cli)?;
    let platform = target_platform(args.platform, &app);
    let store = if args.local {
        &app.context.local_store
    } else {
        &app.context.global_store
    };

    let runtime = store
        .install_archive(
            platform,
            &args.name,
            &args.archive,
            None,
            Map::new(),
            &app.context.prober,
        )
        .with_context(|| format!("failed to install {}", args.archive.display()))?;

    println!(
        "installed {} ({}, {}) at {}",
        args.name,
        runtime.version(),
        platform,
        runtime.binary().display()
    );
    Ok(())
}

pub fn uninstall(args: &UninstallArgs, cli: &Cli) -> Result<()> {
    let app = App::new(cli)?;
    let platform = target_platform(args.platform, &app);
    let store = if args.local {
        &app.context.local_store
    } else {
        &app.context.global_store
    };

    if !store.is_installed(platform, &args.name) {
        anyhow::bail!("{} is not installed for {}", args.name, platform);
    }
    store.uninstall(platform, &args.name);
    println!("uninstalled {} ({})", args.name, platform);
    Ok(())
}

fn target_platform(requested: Option<Platform>, app: &App) -> Platform {
    requested.unwrap_or_else(|| app.context.host.platform())
}
