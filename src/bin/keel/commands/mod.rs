//! Command implementations

pub mod compdb;
pub mod deps;
pub mod flags;
pub mod linkplan;
pub mod plan;
pub mod toolchain;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::cli::GlobalOpts;
use keel::builder::{BuildContext, BuildError};
use keel::core::{find_manifest, Target, Workspace};
use keel::util::fs::write_string;

/// Locate and load the project.
pub fn load_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let manifest_path = match &global.manifest_path {
        Some(path) => {
            if !path.is_file() {
                bail!("manifest not found: {}", path.display());
            }
            path.clone()
        }
        None => {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            find_manifest(&cwd).with_context(|| {
                format!(
                    "could not find `Keel.toml` in `{}` or any parent directory\n\
                     help: Pass --manifest-path or run inside a project",
                    cwd.display()
                )
            })?
        }
    };
    Workspace::load(&manifest_path)
}

/// Load the project and declare its targets, honoring `--toolchain`.
pub fn load_context(global: &GlobalOpts) -> Result<(Workspace, BuildContext)> {
    let ws = load_workspace(global)?;
    let mut registry = ws.toolchain_registry()?;
    if let Some(ref name) = global.toolchain {
        registry.select(name.clone());
        registry.selected()?;
    }
    let cx = ws.build_context(registry)?;
    Ok((ws, cx))
}

/// Look up a target by name.
pub fn find_target<'a>(cx: &'a BuildContext, name: &str) -> Result<&'a Target, BuildError> {
    cx.target(name).ok_or_else(|| BuildError::UnknownTarget {
        name: name.to_string(),
    })
}

/// Write `contents` to `path`, or to stdout when `path` is `-`.
pub fn write_output(path: &Path, contents: &str) -> Result<Option<PathBuf>> {
    if path == Path::new("-") {
        print!("{}", contents);
        return Ok(None);
    }
    write_string(path, contents)?;
    Ok(Some(path.to_path_buf()))
}
