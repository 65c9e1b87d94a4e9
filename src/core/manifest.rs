//! Manifest parsing.
//!
//! A project is described by a root `Keel.toml` holding the `[project]`
//! table, optional `[toolchain.<name>]` tables and, for single-module
//! projects, the targets themselves. Every module listed in
//! `project.modules` has its own `Keel.toml` declaring only targets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::config::ToolchainSettings;
use crate::util::diagnostic::ManifestError;

/// File name of every manifest.
pub const MANIFEST_NAME: &str = "Keel.toml";

/// The root manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub project: ProjectSection,

    /// Toolchain declarations
    #[serde(default)]
    pub toolchain: BTreeMap<String, ToolchainSettings>,

    /// Libraries declared in the root module
    #[serde(default)]
    pub library: Vec<LibraryDecl>,

    /// Binaries declared in the root module
    #[serde(default)]
    pub binary: Vec<BinaryDecl>,
}

/// `[project]`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectSection {
    pub name: String,

    /// Module directories, relative to the project root
    #[serde(default)]
    pub modules: Vec<PathBuf>,

    /// Output tree root, relative to the project root
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

impl Default for ProjectSection {
    fn default() -> Self {
        ProjectSection {
            name: String::new(),
            modules: Vec::new(),
            build_dir: default_build_dir(),
        }
    }
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

/// A module manifest: targets only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    #[serde(default)]
    pub library: Vec<LibraryDecl>,

    #[serde(default)]
    pub binary: Vec<BinaryDecl>,
}

/// `[[library]]`
///
/// Source globs and includes are relative to the module directory;
/// `output` and the generated paths are relative to the module's
/// directory in the output tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LibraryDecl {
    pub name: String,
    pub output: PathBuf,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub generated_sources: Vec<PathBuf>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub generated_includes: Vec<PathBuf>,
    /// Names of libraries this one depends on
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub always_link: bool,
    #[serde(default)]
    pub cflags: Vec<String>,
    #[serde(default)]
    pub cxxflags: Vec<String>,
    #[serde(default)]
    pub asflags: Vec<String>,
    /// pkg-config packages whose compile flags apply
    #[serde(default)]
    pub pkg_config: Vec<String>,
    pub toolchain: Option<String>,
}

/// `[[binary]]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BinaryDecl {
    pub name: String,
    pub output: PathBuf,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub generated_sources: Vec<PathBuf>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub generated_includes: Vec<PathBuf>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub cflags: Vec<String>,
    #[serde(default)]
    pub cxxflags: Vec<String>,
    #[serde(default)]
    pub asflags: Vec<String>,
    #[serde(default)]
    pub ldflags: Vec<String>,
    #[serde(default)]
    pub ldflags_post: Vec<String>,
    /// pkg-config packages whose compile and link flags apply
    #[serde(default)]
    pub pkg_config: Vec<String>,
    pub toolchain: Option<String>,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))
}

fn parse_toml<T: serde::de::DeserializeOwned>(content: &str, path: &Path) -> Result<T, ManifestError> {
    toml::from_str(content).map_err(|e| ManifestError::from_toml(path, content, &e))
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read(path)?;
        Ok(Self::parse(&content, path)?)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let manifest: Manifest = parse_toml(content, path)?;
        if manifest.project.name.trim().is_empty() {
            return Err(ManifestError {
                path: path.to_path_buf(),
                message: "`project.name` must not be empty".to_string(),
                src: miette::NamedSource::new(path.display().to_string(), content.to_string()),
                span: None,
                line_col: None,
            });
        }
        Ok(manifest)
    }

    /// Whether the root manifest declares targets itself.
    pub fn has_targets(&self) -> bool {
        !self.library.is_empty() || !self.binary.is_empty()
    }

    /// The targets of the root module.
    pub fn root_module(&self) -> ModuleManifest {
        ModuleManifest {
            library: self.library.clone(),
            binary: self.binary.clone(),
        }
    }
}

impl ModuleManifest {
    /// Load a module manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read(path)?;
        Ok(Self::parse(&content, path)?)
    }

    /// Parse module manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        parse_toml(content, path)
    }
}

/// Find the root manifest, searching upward from `start`.
///
/// Module manifests have no `[project]` table and are skipped.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() && is_project_manifest(&candidate) {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn is_project_manifest(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.parse::<toml::Table>().ok())
        .is_some_and(|table| table.contains_key("project"))
}
