//! `keel toolchain` command

use anyhow::Result;

use crate::cli::{GlobalOpts, ToolchainArgs, ToolchainCommands};
use keel::builder::Toolchain;
use keel::util::process;

use super::load_workspace;

pub fn execute(global: &GlobalOpts, args: ToolchainArgs) -> Result<()> {
    match args.command {
        ToolchainCommands::Show => show(global),
    }
}

fn show(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let mut registry = ws.toolchain_registry()?;
    if let Some(ref name) = global.toolchain {
        registry.select(name.clone());
    }
    let selected = registry.selected()?;

    println!("Toolchains:");
    for toolchain in registry.iter() {
        println!();
        let marker = if registry.default_name() == Some(toolchain.name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!("  {}{}", toolchain.name, marker);
        print_toolchain(toolchain);
    }

    println!();
    println!("Selected: {}", selected.name);
    Ok(())
}

fn print_toolchain(tc: &Toolchain) {
    let tool = |path: &std::path::Path| {
        if path.as_os_str().is_empty() {
            "not configured".to_string()
        } else {
            path.display().to_string()
        }
    };
    println!("    CC:       {}", tool(tc.cc.as_path()));
    println!("    CXX:      {}", tool(tc.cxx.as_path()));
    println!("    AS:       {}", tool(tc.asm.as_path()));
    println!("    AR:       {}", tool(tc.ar.as_path()));
    println!("    LD:       {}", tool(tc.ld.as_path()));
    if !tc.cflags.is_empty() {
        println!("    CFLAGS:   {}", process::join(&tc.cflags));
    }
    if !tc.cxxflags.is_empty() {
        println!("    CXXFLAGS: {}", process::join(&tc.cxxflags));
    }
    if !tc.asflags.is_empty() {
        println!("    ASFLAGS:  {}", process::join(&tc.asflags));
    }
    if !tc.ldflags.is_empty() {
        println!("    LDFLAGS:  {}", process::join(&tc.ldflags));
    }
    for script in &tc.ldscripts {
        println!("    Script:   {}", script.display());
    }
    if !tc.stddeps.is_empty() {
        println!("    Stddeps:  {}", tc.stddeps.len());
    }
}
