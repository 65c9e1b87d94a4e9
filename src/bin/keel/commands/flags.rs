//! `keel flags` command

use anyhow::Result;

use crate::cli::{GlobalOpts, TargetArgs};
use keel::core::target::LanguageFlags;
use keel::core::{Language, Target};
use keel::util::process;

use super::{find_target, load_context};

pub fn execute(global: &GlobalOpts, args: TargetArgs) -> Result<()> {
    let (_ws, cx) = load_context(global)?;
    let target = find_target(&cx, &args.target)?;
    let resolution = target.resolve(&cx)?;
    let toolchain = &resolution.toolchain;

    let own: &LanguageFlags = match target {
        Target::Library(lib) => lib.flags(),
        Target::Binary(bin) => bin.flags(),
    };

    println!("Flags for `{}` (toolchain {}):", target.name(), toolchain.name);
    println!();
    println!("Include paths:");
    for include in &resolution.includes {
        println!("  {}", include);
    }

    let includes: Vec<String> = resolution
        .includes
        .iter()
        .map(|inc| format!("-I{}", inc.absolute().display()))
        .collect();

    println!();
    for lang in Language::ALL {
        let mut flags: Vec<&str> = toolchain.flags_for(lang).iter().map(String::as_str).collect();
        flags.extend(own.for_language(lang).iter().map(String::as_str));
        flags.extend(includes.iter().map(String::as_str));
        println!("{:<5} {}", format!("{}:", lang), process::join(&flags));
    }

    if let Target::Binary(bin) = target {
        let mut ldflags: Vec<&str> = toolchain.ldflags.iter().map(String::as_str).collect();
        ldflags.extend(bin.ldflags().iter().map(String::as_str));
        println!();
        println!("ldflags:      {}", process::join(&ldflags));
        println!("ldflags-post: {}", process::join(bin.ldflags_post()));
    }
    Ok(())
}
