//! Target definitions - what gets built.
//!
//! Three kinds of target exist:
//!
//! - [`ObjectFile`]: one translation unit compiled to one object
//! - [`Library`]: a thin static archive of objects, usable as a dependency
//! - [`Binary`]: an executable linked from objects and libraries
//!
//! Libraries and binaries are declared once and never change afterwards.
//! Resolving one produces a separate [`Resolution`] (toolchain, transitive
//! libraries, effective include paths) from which build steps are derived.

mod binary;
mod library;
mod object;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::collect::collect;
use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::Executor;
use crate::builder::toolchain::Toolchain;
use crate::core::dependency::{Dependency, LibraryResolvable, ResolveContext};
use crate::core::language::Language;
use crate::core::path::{BuildPath, OutputPath, SourcePath};

pub use binary::{Binary, BinaryBuilder, ResolvedBinary};
pub use library::{Library, LibraryBuilder, ResolvedLibrary};
pub use object::ObjectFile;

/// Per-language compile flag overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageFlags {
    #[serde(default)]
    pub cflags: Vec<String>,
    #[serde(default)]
    pub cxxflags: Vec<String>,
    #[serde(default)]
    pub asflags: Vec<String>,
}

impl LanguageFlags {
    /// Flags for sources of `lang`.
    pub fn for_language(&self, lang: Language) -> &[String] {
        match lang {
            Language::C => &self.cflags,
            Language::Cxx => &self.cxxflags,
            Language::Asm => &self.asflags,
        }
    }

    /// Append flags for one language.
    pub fn extend(&mut self, lang: Language, flags: impl IntoIterator<Item = impl Into<String>>) {
        let target = match lang {
            Language::C => &mut self.cflags,
            Language::Cxx => &mut self.cxxflags,
            Language::Asm => &mut self.asflags,
        };
        target.extend(flags.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.cflags.is_empty() && self.cxxflags.is_empty() && self.asflags.is_empty()
    }
}

/// The kind of a declared target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Library,
    Binary,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Library => write!(f, "library"),
            TargetKind::Binary => write!(f, "binary"),
        }
    }
}

/// A declared library or binary.
#[derive(Debug, Clone)]
pub enum Target {
    Library(Arc<Library>),
    Binary(Arc<Binary>),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Library(lib) => lib.name(),
            Target::Binary(bin) => bin.name(),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Library(_) => TargetKind::Library,
            Target::Binary(_) => TargetKind::Binary,
        }
    }

    pub fn output(&self) -> &OutputPath {
        match self {
            Target::Library(lib) => lib.output(),
            Target::Binary(bin) => bin.output(),
        }
    }

    /// Resolve toolchain, transitive libraries and include paths.
    pub fn resolve(&self, cx: &BuildContext) -> Result<Resolution, BuildError> {
        match self {
            Target::Library(lib) => lib.decl.resolve(cx),
            Target::Binary(bin) => bin.decl.resolve(cx),
        }
    }

    /// Emit this target's own build steps.
    pub fn build(&self, cx: &BuildContext, exec: &mut dyn Executor) -> Result<(), BuildError> {
        match self {
            Target::Library(lib) => lib.build(cx, exec),
            Target::Binary(bin) => bin.build(cx, exec),
        }
    }
}

/// The result of resolving a library or binary.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Toolchain the target is built with
    pub toolchain: Arc<Toolchain>,
    /// Transitive dependency libraries, in collector order
    pub libraries: Vec<Arc<Library>>,
    /// Effective include paths, de-duplicated in first-seen order
    pub includes: Vec<BuildPath>,
}

/// Fields shared by libraries and binaries.
#[derive(Debug, Clone)]
pub(crate) struct Declaration {
    pub(crate) name: String,
    pub(crate) output: OutputPath,
    pub(crate) sources: Vec<BuildPath>,
    pub(crate) deps: Vec<Dependency>,
    pub(crate) includes: Vec<BuildPath>,
    pub(crate) flags: LanguageFlags,
    pub(crate) toolchain: Option<String>,
    pub(crate) module: SourcePath,
}

impl Declaration {
    /// `<module>/include`
    pub(crate) fn module_include(&self) -> SourcePath {
        self.module.join("include")
    }

    pub(crate) fn resolve(&self, cx: &BuildContext) -> Result<Resolution, BuildError> {
        let toolchain = cx.toolchain_for(self.toolchain.as_deref())?;
        let rcx = ResolveContext::new(cx, &toolchain);

        let mut start = Vec::with_capacity(self.deps.len() + toolchain.stddeps.len());
        for dep in &self.deps {
            start.push(dep.resolve(&rcx)?);
        }
        for dep in &toolchain.stddeps {
            let lib = dep.resolve(&rcx)?;
            if *lib.output() == self.output {
                tracing::debug!("`{}` is a standard library of `{}`", self.name, toolchain.name);
                continue;
            }
            start.push(lib);
        }

        let libraries = collect(
            self.output.clone(),
            start,
            &|lib: &Arc<Library>| lib.output().clone(),
            &|lib: &Arc<Library>| {
                lib.deps()
                    .iter()
                    .map(|dep| dep.resolve(&rcx))
                    .collect::<Result<Vec<_>, BuildError>>()
            },
        )?;

        let mut includes = Vec::new();
        let mut push = |path: BuildPath| {
            if !includes.contains(&path) {
                includes.push(path);
            }
        };
        self.includes.iter().cloned().for_each(&mut push);
        push(self.module_include().into());
        for lib in &libraries {
            lib.includes().iter().cloned().for_each(&mut push);
            push(lib.module_include().into());
        }

        tracing::debug!(
            "resolved `{}` with toolchain `{}`: {} libraries, {} include paths",
            self.name,
            toolchain.name,
            libraries.len(),
            includes.len()
        );

        Ok(Resolution {
            toolchain,
            libraries,
            includes,
        })
    }

    /// Emit one compile step per source, returning the object paths.
    pub(crate) fn build_objects(
        &self,
        cx: &BuildContext,
        resolution: &Resolution,
        exec: &mut dyn Executor,
    ) -> Result<Vec<OutputPath>, BuildError> {
        let mut objects = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let output = cx.roots().object_for(&self.output, source);
            let object = ObjectFile::new(output, source.clone())?
                .with_includes(resolution.includes.iter().cloned())
                .with_flags(self.flags.clone());
            objects.push(object.build_with(&resolution.toolchain, exec)?);
        }
        Ok(objects)
    }
}

/// Builder state shared by [`LibraryBuilder`] and [`BinaryBuilder`].
#[derive(Debug, Clone, Default)]
pub(crate) struct DeclarationBuilder {
    pub(crate) name: String,
    pub(crate) output: Option<BuildPath>,
    pub(crate) sources: Vec<BuildPath>,
    pub(crate) deps: Vec<Dependency>,
    pub(crate) includes: Vec<BuildPath>,
    pub(crate) flags: LanguageFlags,
    pub(crate) toolchain: Option<String>,
    pub(crate) module: Option<SourcePath>,
}

impl DeclarationBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        DeclarationBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> BuildError {
        BuildError::InvalidDeclaration {
            target: self.name.clone(),
            field,
            expected,
        }
    }

    pub(crate) fn build(self) -> Result<Declaration, BuildError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name", "a non-empty string"));
        }
        let output = match &self.output {
            Some(BuildPath::Output(path)) => path.clone(),
            _ => return Err(self.invalid("output", "an output-tree path")),
        };
        if self.sources.is_empty() {
            return Err(self.invalid("sources", "a non-empty list of source paths"));
        }
        if self.toolchain.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(self.invalid("toolchain", "a toolchain name"));
        }
        let Some(module) = self.module.clone() else {
            return Err(self.invalid("module", "a source-tree directory"));
        };

        Ok(Declaration {
            name: self.name,
            output,
            sources: self.sources,
            deps: self.deps,
            includes: self.includes,
            flags: self.flags,
            toolchain: self.toolchain,
            module,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_flags() {
        let mut flags = LanguageFlags::default();
        assert!(flags.is_empty());
        flags.extend(Language::C, ["-DC"]);
        flags.extend(Language::Cxx, ["-DCXX"]);
        flags.extend(Language::Asm, ["-DAS"]);
        assert_eq!(flags.for_language(Language::C), ["-DC"]);
        assert_eq!(flags.for_language(Language::Cxx), ["-DCXX"]);
        assert_eq!(flags.for_language(Language::Asm), ["-DAS"]);
    }

    #[test]
    fn test_declaration_requires_fields() {
        let roots = crate::core::path::PathRoots::new("/s", "/o");

        let err = DeclarationBuilder::new("x").build().unwrap_err();
        assert!(matches!(err, BuildError::InvalidDeclaration { field: "output", .. }));

        let mut b = DeclarationBuilder::new("x");
        b.output = Some(roots.source("libx.a").into());
        let err = b.build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "in target `x`: `output` must be an output-tree path"
        );

        let mut b = DeclarationBuilder::new("x");
        b.output = Some(roots.output("libx.a").into());
        let err = b.build().unwrap_err();
        assert!(matches!(err, BuildError::InvalidDeclaration { field: "sources", .. }));

        let mut b = DeclarationBuilder::new("x");
        b.output = Some(roots.output("libx.a").into());
        b.sources.push(roots.source("x.c").into());
        let err = b.build().unwrap_err();
        assert!(matches!(err, BuildError::InvalidDeclaration { field: "module", .. }));

        let mut b = DeclarationBuilder::new("");
        b.output = Some(roots.output("lib.a").into());
        assert!(matches!(
            b.build(),
            Err(BuildError::InvalidDeclaration { field: "name", .. })
        ));
    }
}
