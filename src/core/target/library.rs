//! Static libraries.

use std::sync::Arc;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::{BuildStep, Executor, StepBatch};
use crate::builder::rules;
use crate::core::dependency::Dependency;
use crate::core::language::Language;
use crate::core::path::{BuildPath, OutputPath, SourcePath};

use super::{Declaration, DeclarationBuilder, LanguageFlags, Resolution};

/// A static library: the archive of its own objects.
///
/// Dependencies are not merged into the archive. They are carried to
/// whatever links the library, and their include paths to whatever compiles
/// against it.
#[derive(Debug, Clone)]
pub struct Library {
    pub(crate) decl: Declaration,
    always_link: bool,
}

impl Library {
    pub fn builder(name: impl Into<String>) -> LibraryBuilder {
        LibraryBuilder {
            decl: DeclarationBuilder::new(name),
            always_link: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn output(&self) -> &OutputPath {
        &self.decl.output
    }

    pub fn sources(&self) -> &[BuildPath] {
        &self.decl.sources
    }

    pub fn deps(&self) -> &[Dependency] {
        &self.decl.deps
    }

    /// Own include paths, without the module include.
    pub fn includes(&self) -> &[BuildPath] {
        &self.decl.includes
    }

    pub fn flags(&self) -> &LanguageFlags {
        &self.decl.flags
    }

    /// Name of the toolchain override, if any.
    pub fn toolchain(&self) -> Option<&str> {
        self.decl.toolchain.as_deref()
    }

    /// Whether every object of this library is linked, referenced or not.
    pub fn always_link(&self) -> bool {
        self.always_link
    }

    pub fn module(&self) -> &SourcePath {
        &self.decl.module
    }

    /// The implicit include path `<module>/include`.
    pub fn module_include(&self) -> SourcePath {
        self.decl.module_include()
    }

    pub fn resolve(&self, cx: &BuildContext) -> Result<ResolvedLibrary<'_>, BuildError> {
        Ok(ResolvedLibrary {
            library: self,
            resolution: self.decl.resolve(cx)?,
        })
    }

    /// Emit compile steps for every source and the archive step.
    pub fn build(&self, cx: &BuildContext, exec: &mut dyn Executor) -> Result<(), BuildError> {
        self.resolve(cx)?.build(cx, exec)
    }
}

/// A library together with its resolution.
#[derive(Debug, Clone)]
pub struct ResolvedLibrary<'a> {
    pub library: &'a Library,
    pub resolution: Resolution,
}

impl ResolvedLibrary<'_> {
    pub fn libraries(&self) -> &[Arc<Library>] {
        &self.resolution.libraries
    }

    pub fn includes(&self) -> &[BuildPath] {
        &self.resolution.includes
    }

    /// Emit every object step and the final step, or nothing on failure.
    pub fn build(&self, cx: &BuildContext, exec: &mut dyn Executor) -> Result<(), BuildError> {
        let mut batch = StepBatch::new();
        let objects = self
            .library
            .decl
            .build_objects(cx, &self.resolution, &mut batch)?;

        let rule = rules::archive_rule(&self.resolution.toolchain)?;
        let step = BuildStep::new(&rule)
            .inputs(objects.iter().map(|o| o.absolute()))
            .output(self.library.output().absolute());
        batch.add(step, &rule)?;
        exec.add_batch(batch)
    }
}

/// Builder for [`Library`].
#[derive(Debug, Clone)]
pub struct LibraryBuilder {
    decl: DeclarationBuilder,
    always_link: bool,
}

impl LibraryBuilder {
    /// Where the archive is written. Must be an output-tree path.
    pub fn output(mut self, path: impl Into<BuildPath>) -> Self {
        self.decl.output = Some(path.into());
        self
    }

    pub fn source(mut self, path: impl Into<BuildPath>) -> Self {
        self.decl.sources.push(path.into());
        self
    }

    pub fn sources(mut self, paths: impl IntoIterator<Item = impl Into<BuildPath>>) -> Self {
        self.decl.sources.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn dep(mut self, dep: Dependency) -> Self {
        self.decl.deps.push(dep);
        self
    }

    pub fn deps(mut self, deps: impl IntoIterator<Item = Dependency>) -> Self {
        self.decl.deps.extend(deps);
        self
    }

    pub fn include(mut self, path: impl Into<BuildPath>) -> Self {
        self.decl.includes.push(path.into());
        self
    }

    pub fn flags(mut self, lang: Language, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.decl.flags.extend(lang, flags);
        self
    }

    pub fn toolchain(mut self, name: impl Into<String>) -> Self {
        self.decl.toolchain = Some(name.into());
        self
    }

    pub fn always_link(mut self, always_link: bool) -> Self {
        self.always_link = always_link;
        self
    }

    /// The module directory this library is declared in.
    pub fn module(mut self, dir: SourcePath) -> Self {
        self.decl.module = Some(dir);
        self
    }

    pub fn build(self) -> Result<Library, BuildError> {
        Ok(Library {
            decl: self.decl.build()?,
            always_link: self.always_link,
        })
    }
}
