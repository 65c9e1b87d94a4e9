//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Keel - typed C/C++ targets that synthesize compile, archive and link actions
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to the project's Keel.toml
    #[arg(long, global = true, env = "KEEL_MANIFEST_PATH", value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Toolchain for targets that do not name one
    #[arg(long, global = true, value_name = "NAME")]
    pub toolchain: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize the build graph and write it
    Plan(PlanArgs),

    /// Write compile_commands.json
    Compdb(CompdbArgs),

    /// Show the libraries a target depends on, in link order
    Deps(TargetArgs),

    /// Show the include paths and compile flags of a target
    Flags(TargetArgs),

    /// Show the link line of a binary
    Linkplan(TargetArgs),

    /// Toolchain inspection
    Toolchain(ToolchainArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// build.ninja
    #[default]
    Ninja,
    /// JSON rules and steps
    Json,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = PlanFormat::Ninja)]
    pub format: PlanFormat,

    /// Output file (`-` for stdout; defaults to the build directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Specific targets to plan (defaults to all targets)
    #[arg(long)]
    pub target: Vec<String>,

    /// Number of parallel planning jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CompdbArgs {
    /// Output file (`-` for stdout; defaults to the project root)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Specific targets to include (defaults to all targets)
    #[arg(long)]
    pub target: Vec<String>,
}

#[derive(Args)]
pub struct TargetArgs {
    /// Target name
    pub target: String,
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: ToolchainCommands,
}

#[derive(Subcommand)]
pub enum ToolchainCommands {
    /// Show the registered toolchains
    Show,
}
