//! `keel deps` command

use anyhow::Result;

use crate::cli::{GlobalOpts, TargetArgs};

use super::{find_target, load_context};

pub fn execute(global: &GlobalOpts, args: TargetArgs) -> Result<()> {
    let (ws, cx) = load_context(global)?;
    let target = find_target(&cx, &args.target)?;
    let resolution = target.resolve(&cx)?;

    println!(
        "{} `{}` (toolchain {})",
        target.kind(),
        target.name(),
        resolution.toolchain.name
    );
    if resolution.libraries.is_empty() {
        println!("  (no library dependencies)");
        return Ok(());
    }
    for (i, lib) in resolution.libraries.iter().enumerate() {
        let marker = if lib.always_link() { " [always-link]" } else { "" };
        println!(
            "  {}. {}{}  {}",
            i + 1,
            lib.name(),
            marker,
            ws.roots().relative(&lib.output().clone().into()).display()
        );
    }
    Ok(())
}
