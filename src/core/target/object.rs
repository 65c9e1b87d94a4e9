//! Single translation units.

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::graph::{BuildStep, Executor};
use crate::builder::rules;
use crate::builder::toolchain::Toolchain;
use crate::core::language::Language;
use crate::core::path::{BuildPath, OutputPath};
use crate::util::process;

use super::LanguageFlags;

/// One source file compiled to one object file.
#[derive(Debug, Clone)]
pub struct ObjectFile {
    output: OutputPath,
    source: BuildPath,
    includes: Vec<BuildPath>,
    flags: LanguageFlags,
    toolchain: Option<String>,
}

impl ObjectFile {
    /// Declare an object. `output` must live in the output tree.
    pub fn new(output: impl Into<BuildPath>, source: impl Into<BuildPath>) -> Result<Self, BuildError> {
        let source = source.into();
        let output = match output.into() {
            BuildPath::Output(path) => path,
            BuildPath::Source(_) => {
                return Err(BuildError::InvalidDeclaration {
                    target: source.to_string(),
                    field: "output",
                    expected: "an output-tree path",
                })
            }
        };
        Ok(ObjectFile {
            output,
            source,
            includes: Vec::new(),
            flags: LanguageFlags::default(),
            toolchain: None,
        })
    }

    pub fn with_includes(mut self, includes: impl IntoIterator<Item = BuildPath>) -> Self {
        self.includes.extend(includes);
        self
    }

    pub fn with_flags(mut self, flags: LanguageFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Build with the named toolchain instead of the selected one.
    pub fn with_toolchain(mut self, name: impl Into<String>) -> Self {
        self.toolchain = Some(name.into());
        self
    }

    pub fn output(&self) -> &OutputPath {
        &self.output
    }

    pub fn source(&self) -> &BuildPath {
        &self.source
    }

    /// Language of the source, from its extension.
    pub fn language(&self) -> Result<Language, BuildError> {
        Language::of(&self.source)
    }

    /// Per-file flags: own flags for the language, then `-I` for every
    /// include path in order. Toolchain flags are part of the rule.
    pub fn flags(&self) -> Result<Vec<String>, BuildError> {
        let lang = self.language()?;
        let mut flags = self.flags.for_language(lang).to_vec();
        flags.extend(
            self.includes
                .iter()
                .map(|inc| format!("-I{}", inc.absolute().display())),
        );
        Ok(flags)
    }

    /// Emit the compile step using the toolchain this object resolves to.
    pub fn build(&self, cx: &BuildContext, exec: &mut dyn Executor) -> Result<OutputPath, BuildError> {
        let toolchain = cx.toolchain_for(self.toolchain.as_deref())?;
        self.build_with(&toolchain, exec)
    }

    /// Emit the compile step using `toolchain`.
    pub fn build_with(
        &self,
        toolchain: &Toolchain,
        exec: &mut dyn Executor,
    ) -> Result<OutputPath, BuildError> {
        let lang = self.language()?;
        let rule = rules::compile_rule(toolchain, lang)?;
        let step = BuildStep::new(&rule)
            .input(self.source.absolute())
            .output(self.output.absolute())
            .var("flags", process::join(&self.flags()?));
        exec.add(step, &rule)?;
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::BuildGraph;
    use crate::builder::toolchain::ToolchainRegistry;
    use crate::core::path::PathRoots;
    use std::path::PathBuf;

    fn context() -> BuildContext {
        let mut registry = ToolchainRegistry::new();
        registry.register_as_default(Toolchain::gnu("gcc").with_flags(Language::Cxx, ["-std=c++17"]));
        registry.register(Toolchain::gnu("cross"));
        BuildContext::new(registry, PathRoots::new("/src", "/out"))
    }

    #[test]
    fn test_output_must_be_in_output_tree() {
        let roots = PathRoots::new("/src", "/out");
        let err = ObjectFile::new(roots.source("a.o"), roots.source("a.c")).unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidDeclaration { field: "output", .. }
        ));
    }

    #[test]
    fn test_flags_then_includes() {
        let roots = PathRoots::new("/src", "/out");
        let mut flags = LanguageFlags::default();
        flags.extend(Language::C, ["-DFOO"]);
        flags.extend(Language::Cxx, ["-DBAR"]);

        let obj = ObjectFile::new(roots.output("a.o"), roots.source("a.c"))
            .unwrap()
            .with_flags(flags)
            .with_includes([roots.source("inc").into(), roots.output("gen").into()]);

        assert_eq!(obj.language().unwrap(), Language::C);
        assert_eq!(obj.flags().unwrap(), ["-DFOO", "-I/src/inc", "-I/out/gen"]);
    }

    #[test]
    fn test_build_emits_one_step() {
        let cx = context();
        let roots = cx.roots().clone();
        let obj = ObjectFile::new(roots.output("m.p/main.cpp.o"), roots.source("main.cpp"))
            .unwrap()
            .with_includes([roots.source("include").into()]);

        let mut graph = BuildGraph::new();
        let out = obj.build(&cx, &mut graph).unwrap();
        assert_eq!(out.absolute(), PathBuf::from("/out/m.p/main.cpp.o"));

        assert_eq!(graph.steps.len(), 1);
        let step = &graph.steps[0];
        assert_eq!(step.rule, "gcc-cxx");
        assert_eq!(step.inputs, vec![PathBuf::from("/src/main.cpp")]);
        assert_eq!(step.outputs, vec![PathBuf::from("/out/m.p/main.cpp.o")]);
        assert_eq!(step.variables["flags"], "-I/src/include");
        assert_eq!(
            graph.command_line(step).unwrap(),
            "g++ -c -std=c++17 -I/src/include -o /out/m.p/main.cpp.o -MD -MF /out/m.p/main.cpp.o.d -pipe /src/main.cpp"
        );
    }

    #[test]
    fn test_toolchain_override() {
        let cx = context();
        let roots = cx.roots().clone();
        let obj = ObjectFile::new(roots.output("a.o"), roots.source("a.s"))
            .unwrap()
            .with_toolchain("cross");

        let mut graph = BuildGraph::new();
        obj.build(&cx, &mut graph).unwrap();
        assert_eq!(graph.steps[0].rule, "cross-as");
    }

    #[test]
    fn test_unknown_language_emits_nothing() {
        let cx = context();
        let roots = cx.roots().clone();
        let obj = ObjectFile::new(roots.output("a.o"), roots.source("notes.txt")).unwrap();

        let mut graph = BuildGraph::new();
        assert!(matches!(
            obj.build(&cx, &mut graph),
            Err(BuildError::UnsupportedSource { .. })
        ));
        assert!(graph.steps.is_empty());
    }
}
