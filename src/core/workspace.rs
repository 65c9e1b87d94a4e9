//! Workspace - a loaded project and everything it declares.
//!
//! Loading reads the root manifest and every module manifest. Turning the
//! workspace into a [`BuildContext`] registers toolchains and converts each
//! declaration into a library or binary with typed paths.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::toolchain::{detect_host_toolchain, ToolchainRegistry};
use crate::core::dependency::{dep, LibraryName};
use crate::core::language::Language;
use crate::core::manifest::{BinaryDecl, LibraryDecl, Manifest, ModuleManifest, MANIFEST_NAME};
use crate::core::path::{BuildPath, PathRoots, SourcePath};
use crate::core::target::{Binary, Library};
use crate::util::config::{self, ToolchainConfig};
use crate::util::fs::glob_files;
use crate::util::pkg_config;

/// One module directory and its targets.
#[derive(Debug, Clone)]
pub struct Module {
    /// Directory relative to the project root (empty for the root module)
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
    pub targets: ModuleManifest,
}

impl Module {
    /// Human-readable module name.
    pub fn display_name(&self) -> String {
        if self.dir.as_os_str().is_empty() {
            ".".to_string()
        } else {
            self.dir.display().to_string()
        }
    }
}

/// A loaded project.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    manifest_path: PathBuf,
    manifest: Manifest,
    modules: Vec<Module>,
}

impl Workspace {
    /// Load the project whose root manifest is `manifest_path`.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let root = std::path::absolute(&root)
            .with_context(|| format!("failed to resolve project root: {}", root.display()))?;

        let mut modules = Vec::new();
        if manifest.has_targets() || manifest.project.modules.is_empty() {
            modules.push(Module {
                dir: PathBuf::new(),
                manifest_path: manifest_path.to_path_buf(),
                targets: manifest.root_module(),
            });
        }

        for dir in &manifest.project.modules {
            if dir.is_absolute() {
                bail!(
                    "module `{}` must be a path relative to the project root",
                    dir.display()
                );
            }
            let module_manifest = root.join(dir).join(MANIFEST_NAME);
            let targets = ModuleManifest::load(&module_manifest)
                .with_context(|| format!("failed to load module `{}`", dir.display()))?;
            modules.push(Module {
                dir: dir.clone(),
                manifest_path: module_manifest,
                targets,
            });
        }

        tracing::debug!(
            "loaded project `{}` with {} modules",
            manifest.project.name,
            modules.len()
        );

        Ok(Workspace {
            root,
            manifest_path: manifest_path.to_path_buf(),
            manifest,
            modules,
        })
    }

    pub fn name(&self) -> &str {
        &self.manifest.project.name
    }

    /// The project root directory (source tree root).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// The output tree root.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.manifest.project.build_dir)
    }

    pub fn roots(&self) -> PathRoots {
        PathRoots::new(&self.root, self.build_dir())
    }

    /// Toolchain declarations from config files and the manifest.
    ///
    /// Precedence (highest first): `Keel.toml`, `.keel/toolchain.toml`,
    /// `~/.keel/toolchain.toml`.
    pub fn toolchain_config(&self) -> ToolchainConfig {
        let global = config::global_toolchain_config_path();
        let project = config::project_toolchain_config_path(&self.root);
        let mut config = config::load_toolchain_config(global.as_deref(), &project);
        config.merge(ToolchainConfig {
            toolchain: self.manifest.toolchain.clone(),
        });
        config
    }

    /// Build the toolchain registry.
    ///
    /// With no declared toolchain, the host toolchain is detected and used
    /// as the default. With exactly one declared toolchain, it is the
    /// default. Otherwise exactly one must be marked `default = true`.
    pub fn toolchain_registry(&self) -> Result<ToolchainRegistry> {
        let config = self.toolchain_config();
        let mut registry = ToolchainRegistry::new();

        if config.is_empty() {
            registry.register_as_default(detect_host_toolchain()?);
            return Ok(registry);
        }

        let defaults: Vec<&String> = config
            .toolchain
            .iter()
            .filter(|(_, settings)| settings.is_default())
            .map(|(name, _)| name)
            .collect();
        let default = match (defaults.as_slice(), config.toolchain.len()) {
            ([name], _) => (*name).clone(),
            ([], 1) => config.toolchain.keys().next().cloned().unwrap_or_default(),
            ([], _) => return Err(BuildError::NoDefaultToolchain.into()),
            (names, _) => bail!(
                "more than one default toolchain: {}",
                names.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")
            ),
        };

        for (name, settings) in &config.toolchain {
            let toolchain = settings.to_toolchain(name, &self.root);
            if *name == default {
                registry.register_as_default(toolchain);
            } else {
                registry.register(toolchain);
            }
        }
        Ok(registry)
    }

    /// Declare every target of every module.
    pub fn build_context(&self, registry: ToolchainRegistry) -> Result<BuildContext> {
        let mut cx = BuildContext::new(registry, self.roots());
        for module in &self.modules {
            for decl in &module.targets.library {
                let library = self
                    .library(module, decl)
                    .with_context(|| format!("in module `{}`", module.display_name()))?;
                cx.add_library(library)?;
            }
            for decl in &module.targets.binary {
                let binary = self
                    .binary(module, decl)
                    .with_context(|| format!("in module `{}`", module.display_name()))?;
                cx.add_binary(binary)?;
            }
        }
        Ok(cx)
    }

    /// Load toolchains and declare every target.
    pub fn load_context(&self) -> Result<BuildContext> {
        let registry = self.toolchain_registry()?;
        self.build_context(registry)
    }

    fn library(&self, module: &Module, decl: &LibraryDecl) -> Result<Library> {
        let roots = self.roots();
        let paths = self.target_paths(
            module,
            &decl.name,
            &decl.sources,
            &decl.generated_sources,
            &decl.includes,
            &decl.generated_includes,
        )?;
        let pkg = pkg_config::probe(&decl.pkg_config)?;

        let mut builder = Library::builder(&decl.name)
            .output(roots.output(module.dir.join(&decl.output)))
            .sources(paths.sources)
            .module(paths.module)
            .deps(decl.deps.iter().map(|name| dep(LibraryName::new(name.clone()))))
            .flags(Language::C, decl.cflags.iter().chain(&pkg.cflags).cloned())
            .flags(Language::Cxx, decl.cxxflags.iter().chain(&pkg.cflags).cloned())
            .flags(Language::Asm, decl.asflags.iter().cloned())
            .always_link(decl.always_link);
        for include in paths.includes {
            builder = builder.include(include);
        }
        if let Some(ref tc) = decl.toolchain {
            builder = builder.toolchain(tc.clone());
        }
        Ok(builder.build()?)
    }

    fn binary(&self, module: &Module, decl: &BinaryDecl) -> Result<Binary> {
        let roots = self.roots();
        let paths = self.target_paths(
            module,
            &decl.name,
            &decl.sources,
            &decl.generated_sources,
            &decl.includes,
            &decl.generated_includes,
        )?;
        let pkg = pkg_config::probe(&decl.pkg_config)?;

        let mut builder = Binary::builder(&decl.name)
            .output(roots.output(module.dir.join(&decl.output)))
            .sources(paths.sources)
            .module(paths.module)
            .deps(decl.deps.iter().map(|name| dep(LibraryName::new(name.clone()))))
            .flags(Language::C, decl.cflags.iter().chain(&pkg.cflags).cloned())
            .flags(Language::Cxx, decl.cxxflags.iter().chain(&pkg.cflags).cloned())
            .flags(Language::Asm, decl.asflags.iter().cloned())
            .ldflags(decl.ldflags.iter().cloned())
            .ldflags_post(decl.ldflags_post.iter().chain(&pkg.libs).cloned());
        for include in paths.includes {
            builder = builder.include(include);
        }
        if let Some(ref tc) = decl.toolchain {
            builder = builder.toolchain(tc.clone());
        }
        Ok(builder.build()?)
    }

    fn target_paths(
        &self,
        module: &Module,
        name: &str,
        sources: &[String],
        generated_sources: &[PathBuf],
        includes: &[PathBuf],
        generated_includes: &[PathBuf],
    ) -> Result<TargetPaths> {
        let roots = self.roots();
        let module_dir = self.root.join(&module.dir);

        let mut all_sources: Vec<BuildPath> = glob_files(&module_dir, sources)
            .with_context(|| format!("failed to expand sources of `{}`", name))?
            .into_iter()
            .map(|p| SourcePath::new(p).into())
            .collect();
        all_sources.extend(
            generated_sources
                .iter()
                .map(|p| roots.output(module.dir.join(p)).into()),
        );

        let mut all_includes: Vec<BuildPath> = includes
            .iter()
            .map(|p| SourcePath::new(module_dir.join(p)).into())
            .collect();
        all_includes.extend(
            generated_includes
                .iter()
                .map(|p| roots.output(module.dir.join(p)).into()),
        );

        Ok(TargetPaths {
            sources: all_sources,
            includes: all_includes,
            module: SourcePath::new(module_dir),
        })
    }
}

struct TargetPaths {
    sources: Vec<BuildPath>,
    includes: Vec<BuildPath>,
    module: SourcePath,
}
