//! List command - show every discovered runtime

use anyhow::Result;
use brokkr_java::{JavaRegistry, JavaRuntime};

use crate::cli::{Cli, ListArgs};
use crate::context::App;

pub async fn run(args: &ListArgs, cli: &Cli) -> Result<()> {
    let app = App::new(cli)?;
    let registry = JavaRegistry::new(app.context);
    if args.refresh {
        registry.refresh();
    } else {
        registry.initialize();
    }

    let runtimes = registry.sorted().await;
    if runtimes.is_empty() {
        println!("no java runtimes found");
        return Ok(());
    }
    for runtime in &runtimes {
        println!("{}", describe(runtime));
    }
    Ok(())
}

fn describe(runtime: &JavaRuntime) -> String {
    let mut line = format!(
        "{:<12} {:<14}",
        runtime.version(),
        runtime.platform().to_string()
    );
    if let Some(vendor) = runtime.vendor() {
        line.push_str(&format!(" {vendor:<20}"));
    } else {
        line.push_str(&format!(" {:<20}", "-"));
    }
    line.push_str(&format!(" {}", runtime.binary().display()));
    if runtime.is_managed() {
        line.push_str(" (managed)");
    }
    line
}
