//! Executables.

use std::sync::Arc;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::{BuildStep, Executor, StepBatch};
use crate::builder::rules;
use crate::core::dependency::Dependency;
use crate::core::language::Language;
use crate::core::path::{BuildPath, OutputPath, SourcePath};
use crate::util::process;

use super::{Declaration, DeclarationBuilder, LanguageFlags, Library, Resolution};

/// An executable linked from its own objects and every library it
/// transitively depends on. Nothing depends on a binary.
#[derive(Debug, Clone)]
pub struct Binary {
    pub(crate) decl: Declaration,
    ldflags: Vec<String>,
    ldflags_post: Vec<String>,
}

impl Binary {
    pub fn builder(name: impl Into<String>) -> BinaryBuilder {
        BinaryBuilder {
            decl: DeclarationBuilder::new(name),
            ldflags: Vec::new(),
            ldflags_post: Vec::new(),
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

    pub fn includes(&self) -> &[BuildPath] {
        &self.decl.includes
    }

    pub fn flags(&self) -> &LanguageFlags {
        &self.decl.flags
    }

    pub fn toolchain(&self) -> Option<&str> {
        self.decl.toolchain.as_deref()
    }

    /// Flags placed before the objects on the link line.
    pub fn ldflags(&self) -> &[String] {
        &self.ldflags
    }

    /// Flags placed after the libraries on the link line.
    pub fn ldflags_post(&self) -> &[String] {
        &self.ldflags_post
    }

    pub fn module(&self) -> &SourcePath {
        &self.decl.module
    }

    pub fn module_include(&self) -> SourcePath {
        self.decl.module_include()
    }

    pub fn resolve(&self, cx: &BuildContext) -> Result<ResolvedBinary<'_>, BuildError> {
        Ok(ResolvedBinary {
            binary: self,
            resolution: self.decl.resolve(cx)?,
        })
    }

    /// Emit compile steps for every source and the link step.
    pub fn build(&self, cx: &BuildContext, exec: &mut dyn Executor) -> Result<(), BuildError> {
        self.resolve(cx)?.build(cx, exec)
    }
}

/// A binary together with its resolution.
#[derive(Debug, Clone)]
pub struct ResolvedBinary<'a> {
    pub binary: &'a Binary,
    pub resolution: Resolution,
}

impl ResolvedBinary<'_> {
    pub fn libraries(&self) -> &[Arc<Library>] {
        &self.resolution.libraries
    }

    pub fn includes(&self) -> &[BuildPath] {
        &self.resolution.includes
    }

    /// The `libs` link variable.
    ///
    /// Always-link libraries are bracketed by `--whole-archive` and
    /// `--no-whole-archive`; every other library follows the bracket. Both
    /// groups keep collector order.
    pub fn link_libs(&self) -> String {
        let (always, normal): (Vec<&Arc<Library>>, Vec<&Arc<Library>>) = self
            .libraries()
            .iter()
            .partition(|lib| lib.always_link());

        let path = |lib: &&Arc<Library>| process::quote(&lib.output().absolute().to_string_lossy());

        let mut parts = Vec::with_capacity(self.libraries().len() + 2);
        parts.push("-Wl,--whole-archive".to_string());
        parts.extend(always.iter().map(path));
        parts.push("-Wl,--no-whole-archive".to_string());
        parts.extend(normal.iter().map(path));
        parts.join(" ")
    }

    /// Emit every object step and the final step, or nothing on failure.
    pub fn build(&self, cx: &BuildContext, exec: &mut dyn Executor) -> Result<(), BuildError> {
        let mut batch = StepBatch::new();
        let objects = self
            .binary
            .decl
            .build_objects(cx, &self.resolution, &mut batch)?;

        let rule = rules::link_rule(&self.resolution.toolchain)?;
        let objs: Vec<String> = objects
            .iter()
            .map(|o| o.absolute().to_string_lossy().into_owned())
            .collect();

        let step = BuildStep::new(&rule)
            .inputs(objects.iter().map(|o| o.absolute()))
            .inputs(self.libraries().iter().map(|lib| lib.output().absolute()))
            .output(self.binary.output().absolute())
            .var("ldflags", process::join(self.binary.ldflags()))
            .var("ldflags_post", process::join(self.binary.ldflags_post()))
            .var("libs", self.link_libs())
            .var("objs", process::join(&objs));
        batch.add(step, &rule)?;
        exec.add_batch(batch)
    }
}

/// Builder for [`Binary`].
#[derive(Debug, Clone)]
pub struct BinaryBuilder {
    decl: DeclarationBuilder,
    ldflags: Vec<String>,
    ldflags_post: Vec<String>,
}

impl BinaryBuilder {
    /// Where the executable is written. Must be an output-tree path.
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

    pub fn ldflags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ldflags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn ldflags_post(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ldflags_post.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn module(mut self, dir: SourcePath) -> Self {
        self.decl.module = Some(dir);
        self
    }

    pub fn build(self) -> Result<Binary, BuildError> {
        Ok(Binary {
            decl: self.decl.build()?,
            ldflags: self.ldflags,
            ldflags_post: self.ldflags_post,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::BuildGraph;
    use crate::builder::toolchain::{Toolchain, ToolchainRegistry};
    use crate::core::dependency::{dep, LibraryName};
    use crate::core::path::PathRoots;
    use std::path::{Path, PathBuf};

    fn context() -> BuildContext {
        let mut registry = ToolchainRegistry::new();
        registry.register_as_default(Toolchain::gnu("gcc"));
        BuildContext::new(registry, PathRoots::new("/src", "/out"))
    }

    fn add_lib(cx: &mut BuildContext, name: &str, always_link: bool, deps: &[&str]) {
        let roots = cx.roots().clone();
        let lib = Library::builder(name)
            .output(roots.output(format!("lib{}.a", name)))
            .source(roots.source(format!("{}/{}.c", name, name)))
            .module(roots.source(name))
            .always_link(always_link)
            .deps(deps.iter().map(|d| dep(LibraryName::new(*d))))
            .build()
            .unwrap();
        cx.add_library(lib).unwrap();
    }

    fn app(cx: &BuildContext, deps: &[&str]) -> Binary {
        let roots = cx.roots();
        Binary::builder("app")
            .output(roots.output("app/app"))
            .source(roots.source("app/main.c"))
            .module(roots.source("app"))
            .deps(deps.iter().map(|d| dep(LibraryName::new(*d))))
            .ldflags(["-static"])
            .ldflags_post(["-lm"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_link_line_brackets_always_link() {
        let mut cx = context();
        add_lib(&mut cx, "l3", false, &[]);
        add_lib(&mut cx, "l2", false, &["l3"]);
        add_lib(&mut cx, "l1", true, &[]);
        let bin = app(&cx, &["l1", "l2"]);

        let resolved = bin.resolve(&cx).unwrap();
        assert_eq!(
            resolved.link_libs(),
            "-Wl,--whole-archive /out/libl1.a -Wl,--no-whole-archive /out/libl2.a /out/libl3.a"
        );
    }

    #[test]
    fn test_always_link_bracket_ignores_graph_position() {
        let mut cx = context();
        add_lib(&mut cx, "deep", true, &[]);
        add_lib(&mut cx, "mid", false, &["deep"]);
        let bin = app(&cx, &["mid"]);

        let libs = bin.resolve(&cx).unwrap().link_libs();
        assert_eq!(
            libs,
            "-Wl,--whole-archive /out/libdeep.a -Wl,--no-whole-archive /out/libmid.a"
        );
    }

    #[test]
    fn test_link_step() {
        let mut cx = context();
        add_lib(&mut cx, "l3", false, &[]);
        add_lib(&mut cx, "l2", false, &["l3"]);
        add_lib(&mut cx, "l1", true, &[]);
        let bin = app(&cx, &["l1", "l2"]);

        let mut graph = BuildGraph::new();
        bin.build(&cx, &mut graph).unwrap();

        assert_eq!(graph.steps.len(), 2);
        let link = graph.producer(Path::new("/out/app/app")).unwrap();
        assert_eq!(link.rule, "gcc-ld");
        assert_eq!(
            link.inputs,
            [
                PathBuf::from("/out/app/app.p/src/app/main.c.o"),
                PathBuf::from("/out/libl1.a"),
                PathBuf::from("/out/libl2.a"),
                PathBuf::from("/out/libl3.a"),
            ]
        );
        assert_eq!(link.variables["ldflags"], "-static");
        assert_eq!(link.variables["ldflags_post"], "-lm");
        assert_eq!(link.variables["objs"], "/out/app/app.p/src/app/main.c.o");
        assert_eq!(
            graph.command_line(link).unwrap(),
            "g++ -static -o /out/app/app /out/app/app.p/src/app/main.c.o \
             -Wl,--whole-archive /out/libl1.a -Wl,--no-whole-archive /out/libl2.a /out/libl3.a -lm"
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let cx = context();
        let bin = app(&cx, &["missing"]);
        let mut graph = BuildGraph::new();
        assert!(matches!(
            bin.build(&cx, &mut graph),
            Err(BuildError::UnknownDependency { ref name }) if name == "missing"
        ));
        assert!(graph.steps.is_empty());
    }

    #[test]
    fn test_unsupported_second_source_emits_nothing() {
        let cx = context();
        let roots = cx.roots().clone();
        let bin = Binary::builder("tool")
            .output(roots.output("tool"))
            .sources([roots.source("tool/main.c"), roots.source("tool/README")])
            .module(roots.source("tool"))
            .build()
            .unwrap();

        let mut graph = BuildGraph::new();
        assert!(bin.build(&cx, &mut graph).is_err());
        assert!(graph.steps.is_empty());
        assert!(graph.producer(Path::new("/out/tool.p/src/tool/main.c.o")).is_none());
    }
}
