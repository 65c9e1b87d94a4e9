//! `keel linkplan` command

use anyhow::{anyhow, Result};

use crate::cli::{GlobalOpts, TargetArgs};
use keel::builder::BuildGraph;
use keel::core::Target;

use super::{find_target, load_context};

pub fn execute(global: &GlobalOpts, args: TargetArgs) -> Result<()> {
    let (ws, cx) = load_context(global)?;
    let binary = match find_target(&cx, &args.target)? {
        Target::Binary(bin) => bin,
        Target::Library(_) => {
            return Err(anyhow!(
                "`{}` is a library; linkplan shows binaries\n\
                 help: Run `keel deps {}` to see its dependencies",
                args.target,
                args.target
            ))
        }
    };
    let resolved = binary.resolve(&cx)?;

    println!("Link order for `{}`:", binary.name());
    println!();
    if resolved.libraries().is_empty() {
        println!("  (no link dependencies)");
    }
    for (i, lib) in resolved.libraries().iter().enumerate() {
        println!(
            "  {}. {}",
            i + 1,
            ws.roots().relative(&lib.output().clone().into()).display()
        );
        let how = if lib.always_link() {
            "whole archive"
        } else {
            "normal"
        };
        println!("     From: {} ({})", lib.name(), how);
    }

    let mut graph = BuildGraph::new();
    resolved.build(&cx, &mut graph)?;
    let command = graph
        .producer(binary.output().absolute())
        .and_then(|step| graph.command_line(step))
        .ok_or_else(|| anyhow!("no link step was emitted for `{}`", binary.name()))?;

    println!();
    println!("Link command:");
    println!("  {}", command);
    Ok(())
}
