//! `keel plan` command

use anyhow::{Context, Result};

use crate::cli::{GlobalOpts, PlanArgs, PlanFormat};
use keel::builder::context::set_jobs;
use keel::builder::{ninja, BuildGraph};

use super::{load_context, write_output};

pub fn execute(global: &GlobalOpts, args: PlanArgs) -> Result<()> {
    set_jobs(args.jobs);
    let (ws, cx) = load_context(global)?;

    let mut graph = BuildGraph::new();
    let targets = cx.build_all(&args.target, &mut graph)?;

    let (contents, default_name) = match args.format {
        PlanFormat::Ninja => (ninja::render(&graph), "build.ninja"),
        PlanFormat::Json => (
            graph.to_json().context("failed to serialize build plan")?,
            "plan.json",
        ),
    };
    let output = args
        .output
        .unwrap_or_else(|| ws.build_dir().join(default_name));

    if let Some(path) = write_output(&output, &contents)? {
        eprintln!(
            "Planned {} targets ({} steps) into {}",
            targets,
            graph.steps.len(),
            path.display()
        );
    }
    Ok(())
}
