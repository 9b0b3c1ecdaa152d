//! Select command - pick the best runtime for a game version

use anyhow::Result;
use brokkr_core::VersionNumber;
use brokkr_java::{select_java, JavaRegistry, SelectionContext, Workload};

use crate::cli::{Cli, SelectArgs};
use crate::context::App;

pub async fn run(args: &SelectArgs, cli: &Cli) -> Result<()> {
    let app = App::new(cli)?;
    let registry = JavaRegistry::new(app.context);
    registry.initialize();
    let snapshot = registry.get_all().await;

    let workload = Workload {
        forge_patch_version: args.forge.as_deref().map(VersionNumber::new),
        launch_wrapper_version: args.launch_wrapper.as_deref().map(VersionNumber::new),
        declared_java_major: args.declared_java,
    };
    let ctx = SelectionContext::new(
        &registry.context().host,
        args.game.as_deref().map(VersionNumber::new),
    )
    .with_workload(workload);

    match select_java(snapshot.values(), &ctx) {
        Some(runtime) => {
            println!("{} {}", runtime.version(), runtime.binary().display());
            Ok(())
        }
        None => anyhow::bail!("no suitable java runtime found"),
    }
}
