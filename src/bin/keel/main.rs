//! Keel CLI - C/C++ target definitions to build graphs

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keel::builder::BuildError;
use keel::util::diagnostic::{self, ManifestError};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("keel=debug")
    } else {
        EnvFilter::new("keel=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color && std::io::stderr().is_terminal();
    if let Err(e) = run(cli) {
        report(e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Plan(args) => commands::plan::execute(&global, args),
        Commands::Compdb(args) => commands::compdb::execute(&global, args),
        Commands::Deps(args) => commands::deps::execute(&global, args),
        Commands::Flags(args) => commands::flags::execute(&global, args),
        Commands::Linkplan(args) => commands::linkplan::execute(&global, args),
        Commands::Toolchain(args) => commands::toolchain::execute(&global, args),
    }
}

/// Print an error, as a diagnostic when it carries one.
fn report(err: anyhow::Error, color: bool) {
    let outer: Vec<String> = err
        .chain()
        .take_while(|cause| !cause.is::<BuildError>() && !cause.is::<ManifestError>())
        .map(|cause| cause.to_string())
        .collect();

    if let Some(build) = err.downcast_ref::<BuildError>() {
        let mut diag = build.to_diagnostic();
        for context in outer {
            diag = diag.with_context(context);
        }
        diagnostic::emit(&diag, color);
        return;
    }

    match err.downcast::<ManifestError>() {
        Ok(manifest) if color => eprintln!("{:?}", miette::Report::new(manifest)),
        Ok(manifest) => diagnostic::emit(&manifest.to_diagnostic(), false),
        Err(err) => eprintln!("error: {:#}", err),
    }
}
