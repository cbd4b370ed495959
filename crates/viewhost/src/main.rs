//! Entry point wiring the CLI surface, settings discovery and the presenter frame loop,
//! plus utility commands like `viewhost where` and `viewhost backends`.
//!
//! Types:
//!
//! - None; this module focuses on orchestrating submodules.
//!
//! Functions:
//!
//! - `main` parses CLI input, initialises tracing, and dispatches to modes.
//! - `run_backends`, `run_where` and `run_init` back the subcommands.

mod bootstrap;
mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::{Command, InitArgs, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Backends) => run_backends(),
        Some(Command::Where) => run_where(&cli.run),
        Some(Command::Init(args)) => run_init(&cli.run, &args),
        None => run::run(cli.run),
    }
}

fn run_backends() -> Result<()> {
    println!("Backends in preference order:");
    for backend in presenter::available_backends() {
        println!("  {backend}");
    }
    Ok(())
}

fn run_where(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover(args.config.as_deref())?;
    let settings = paths.settings_file();
    println!("Settings:");
    println!("  directory:  {}", paths.config_dir().display());
    println!(
        "  file:       {}{}",
        settings.display(),
        if settings.exists() { "" } else { " (missing)" }
    );
    Ok(())
}

fn run_init(run: &RunArgs, args: &InitArgs) -> Result<()> {
    let paths = AppPaths::discover(run.config.as_deref())?;
    bootstrap::write_default_settings(&paths, args.force)?;
    println!("Wrote {}", paths.settings_file().display());
    Ok(())
}
