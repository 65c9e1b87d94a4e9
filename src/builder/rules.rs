//! Command templates.
//!
//! Pure functions from a toolchain (and a language, for compiles) to the
//! [`BuildRule`] steps of that kind reference. Rule names are namespaced by
//! toolchain so two toolchains never share a rule.

use std::collections::BTreeMap;

use crate::builder::errors::BuildError;
use crate::builder::graph::BuildRule;
use crate::builder::toolchain::{Tool, Toolchain};
use crate::core::language::Language;
use crate::util::process::quote;

/// The kinds of action a toolchain provides rules for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Compile(Language),
    Archive,
    Link,
}

impl Action {
    pub fn suffix(&self) -> &'static str {
        match self {
            Action::Compile(lang) => lang.rule_suffix(),
            Action::Archive => "ar",
            Action::Link => "ld",
        }
    }
}

/// `<toolchain>-<action>`
pub fn rule_name(toolchain: &Toolchain, action: Action) -> String {
    format!("{}-{}", toolchain.name, action.suffix())
}

/// Shell-quote a literal and escape `$` so the template leaves it alone.
fn literal(arg: &str) -> String {
    quote(arg).replace('$', "$$")
}

/// Rule for compiling sources of `lang`.
///
/// Toolchain flags come before the per-file `$flags`, and every compile
/// writes a make-style depfile next to the object.
pub fn compile_rule(toolchain: &Toolchain, lang: Language) -> Result<BuildRule, BuildError> {
    let compiler = toolchain.tool(Tool::compiler_for(lang))?;

    let mut command = literal(&compiler.to_string_lossy());
    command.push_str(" -c");
    for flag in toolchain.flags_for(lang) {
        command.push(' ');
        command.push_str(&literal(flag));
    }
    command.push_str(" $flags -o $out -MD -MF $out.d -pipe $in");

    let mut variables = BTreeMap::new();
    variables.insert("depfile".to_string(), "$out.d".to_string());
    variables.insert("deps".to_string(), "gcc".to_string());

    let label = match lang {
        Language::C => "CC",
        Language::Cxx => "CXX",
        Language::Asm => "AS",
    };

    Ok(BuildRule {
        name: rule_name(toolchain, Action::Compile(lang)),
        command,
        description: format!("{} $out", label),
        variables,
        compdb: true,
    })
}

/// Rule for creating a thin static archive.
pub fn archive_rule(toolchain: &Toolchain) -> Result<BuildRule, BuildError> {
    let ar = toolchain.tool(Tool::Archiver)?;
    Ok(BuildRule {
        name: rule_name(toolchain, Action::Archive),
        command: format!("rm -f $out && {} rcsT $out $in", literal(&ar.to_string_lossy())),
        description: "AR $out".to_string(),
        variables: BTreeMap::new(),
        compdb: false,
    })
}

/// Rule for linking a binary.
pub fn link_rule(toolchain: &Toolchain) -> Result<BuildRule, BuildError> {
    let ld = toolchain.tool(Tool::Linker)?;

    let mut command = literal(&ld.to_string_lossy());
    for flag in &toolchain.ldflags {
        command.push(' ');
        command.push_str(&literal(flag));
    }
    for script in &toolchain.ldscripts {
        command.push(' ');
        command.push_str(&literal(&format!("-T{}", script.display())));
    }
    command.push_str(" $ldflags -o $out $objs $libs $ldflags_post");

    Ok(BuildRule {
        name: rule_name(toolchain, Action::Link),
        command,
        description: "LINK $out".to_string(),
        variables: BTreeMap::new(),
        compdb: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::PathRoots;

    fn gcc() -> Toolchain {
        Toolchain::gnu("gcc")
            .with_flags(Language::C, ["-std=c11"])
            .with_ldflags(["-static"])
            .with_ldscript("/ld/board.ld")
    }

    #[test]
    fn test_compile_rule_template() {
        let rule = compile_rule(&gcc(), Language::C).unwrap();
        assert_eq!(rule.name, "gcc-c");
        assert_eq!(
            rule.command,
            "gcc -c -std=c11 $flags -o $out -MD -MF $out.d -pipe $in"
        );
        assert_eq!(rule.variables["depfile"], "$out.d");
        assert_eq!(rule.variables["deps"], "gcc");
        assert!(rule.compdb);
    }

    #[test]
    fn test_rule_suffix_follows_extension() {
        let roots = PathRoots::new("/s", "/o");
        let tc = gcc();
        let name = |file: &str| -> Result<String, BuildError> {
            let lang = Language::of(&roots.source(file).into())?;
            Ok(compile_rule(&tc, lang)?.name)
        };

        assert!(name("a.cpp").unwrap().ends_with("-cxx"));
        assert!(name("a.c").unwrap().ends_with("-c"));
        assert!(name("a.s").unwrap().ends_with("-as"));
        assert!(name("a.S").unwrap().ends_with("-as"));
        assert!(matches!(
            name("a.txt"),
            Err(BuildError::UnsupportedSource { .. })
        ));
    }

    #[test]
    fn test_archive_rule_is_thin() {
        let rule = archive_rule(&gcc()).unwrap();
        assert_eq!(rule.name, "gcc-ar");
        assert_eq!(rule.command, "rm -f $out && ar rcsT $out $in");
        assert!(!rule.compdb);
    }

    #[test]
    fn test_link_rule_order() {
        let rule = link_rule(&gcc()).unwrap();
        assert_eq!(rule.name, "gcc-ld");
        assert_eq!(
            rule.command,
            "g++ -static -T/ld/board.ld $ldflags -o $out $objs $libs $ldflags_post"
        );
    }

    #[test]
    fn test_missing_tool_fails_fast() {
        let tc = Toolchain::new("bare").with_tool(Tool::CCompiler, "cc");
        assert!(compile_rule(&tc, Language::C).is_ok());
        assert!(matches!(
            compile_rule(&tc, Language::Cxx),
            Err(BuildError::MissingTool { .. })
        ));
        assert!(archive_rule(&tc).is_err());
        assert!(link_rule(&tc).is_err());
    }

    #[test]
    fn test_tool_paths_with_spaces_are_quoted() {
        let tc = Toolchain::gnu("win").with_tool(Tool::Archiver, "/opt/my tools/ar");
        let rule = archive_rule(&tc).unwrap();
        assert_eq!(rule.command, "rm -f $out && '/opt/my tools/ar' rcsT $out $in");
    }

    #[test]
    fn test_dollar_in_toolchain_flags_survives_expansion() {
        use crate::builder::graph::{BuildGraph, BuildStep, Executor};

        let tc = Toolchain::gnu("gcc")
            .with_flags(Language::C, ["-DPRICE=$5"])
            .with_ldscript("/ld/$board.ld");
        let rule = compile_rule(&tc, Language::C).unwrap();
        assert!(rule.command.contains(" '-DPRICE=$$5' "));
        assert!(link_rule(&tc).unwrap().command.contains("'-T/ld/$$board.ld'"));

        let mut graph = BuildGraph::new();
        let step = BuildStep::new(&rule).input("/s/a.c").output("/o/a.c.o");
        graph.add(step, &rule).unwrap();
        let line = graph.command_line(&graph.steps[0]).unwrap();
        assert!(line.contains(" '-DPRICE=$5' "), "{}", line);
    }
}
