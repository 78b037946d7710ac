//! Check-config command - validate and print the effective configuration.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the check-config command.
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Only validate; print nothing on success
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the check-config command.
pub fn run(args: CheckConfigArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    if args.quiet {
        return Ok(());
    }

    match &loaded.source {
        Some(path) => println!("# Loaded from {}\n", path.display()),
        None => println!("# No config file found (using defaults)\n"),
    }
    print!("{}", loaded.config.to_toml()?);
    Ok(())
}
