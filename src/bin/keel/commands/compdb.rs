//! `keel compdb` command

use anyhow::{Context, Result};

use crate::cli::{CompdbArgs, GlobalOpts};
use keel::builder::BuildGraph;

use super::{load_context, write_output};

pub fn execute(global: &GlobalOpts, args: CompdbArgs) -> Result<()> {
    let (ws, cx) = load_context(global)?;

    let mut graph = BuildGraph::new();
    cx.build_all(&args.target, &mut graph)?;

    let commands = graph.compile_commands(ws.root());
    let json = serde_json::to_string_pretty(&commands)
        .context("failed to serialize compile_commands.json")?;

    let output = args
        .output
        .unwrap_or_else(|| ws.root().join("compile_commands.json"));
    if let Some(path) = write_output(&output, &format!("{}\n", json))? {
        eprintln!("Wrote {} entries to {}", commands.len(), path.display());
    }
    Ok(())
}
