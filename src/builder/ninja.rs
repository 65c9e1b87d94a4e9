//! Ninja file writer.

use std::fmt::Write;
use std::path::Path;

use crate::builder::graph::{BuildGraph, BuildRule, BuildStep};

/// Escape a path for a `build` line.
pub fn escape_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '$' => out.push_str("$$"),
            ' ' => out.push_str("$ "),
            ':' => out.push_str("$:"),
            '\n' => out.push_str("$\n"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a variable value. Only `$` is significant here, and command
/// placeholders must survive, so values are written verbatim except for
/// newlines.
fn escape_value(value: &str) -> String {
    value.replace('\n', "$\n")
}

/// Render `graph` as a `build.ninja` file.
pub fn render(graph: &BuildGraph) -> String {
    let mut out = String::new();
    out.push_str("# Generated by keel. Do not edit.\n");
    out.push_str("ninja_required_version = 1.7\n");

    for rule in &graph.rules {
        out.push('\n');
        write_rule(&mut out, rule);
    }

    if !graph.steps.is_empty() {
        out.push('\n');
    }
    for step in &graph.steps {
        write_step(&mut out, step);
    }
    out
}

fn write_rule(out: &mut String, rule: &BuildRule) {
    let _ = writeln!(out, "rule {}", rule.name);
    let _ = writeln!(out, "  command = {}", escape_value(&rule.command));
    let _ = writeln!(out, "  description = {}", escape_value(&rule.description));
    for (name, value) in &rule.variables {
        let _ = writeln!(out, "  {} = {}", name, escape_value(value));
    }
}

fn write_step(out: &mut String, step: &BuildStep) {
    let outputs: Vec<String> = step.outputs.iter().map(|p| escape_path(p)).collect();
    let inputs: Vec<String> = step.inputs.iter().map(|p| escape_path(p)).collect();

    let _ = write!(out, "build {}: {}", outputs.join(" "), step.rule);
    for input in &inputs {
        let _ = write!(out, " {}", input);
    }
    out.push('\n');

    // Step variables are literal text; `$` in them must not be expanded
    // a second time by ninja.
    for (name, value) in &step.variables {
        let _ = writeln!(out, "  {} = {}", name, value.replace('$', "$$").replace('\n', "$\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::Executor;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape_path() {
        assert_eq!(escape_path(Path::new("/a b/c:d$e")), "/a$ b/c$:d$$e");
    }

    #[test]
    fn test_render() {
        let mut variables = BTreeMap::new();
        variables.insert("depfile".to_string(), "$out.d".to_string());
        let rule = BuildRule {
            name: "gcc-c".to_string(),
            command: "gcc -c $flags -o $out $in".to_string(),
            description: "CC $out".to_string(),
            variables,
            compdb: true,
        };

        let mut graph = BuildGraph::new();
        graph
            .add(
                BuildStep::new(&rule)
                    .input("/src/my file.c")
                    .output("/out/my file.c.o")
                    .var("flags", "-DPRICE=$5"),
                &rule,
            )
            .unwrap();

        let ninja = render(&graph);
        assert!(ninja.contains("rule gcc-c\n  command = gcc -c $flags -o $out $in\n"));
        assert!(ninja.contains("  depfile = $out.d\n"));
        assert!(ninja.contains("build /out/my$ file.c.o: gcc-c /src/my$ file.c\n"));
        assert!(ninja.contains("  flags = -DPRICE=$$5\n"));
    }

    #[test]
    fn test_toolchain_flag_with_dollar_renders_escaped() {
        use crate::builder::rules::compile_rule;
        use crate::builder::toolchain::Toolchain;
        use crate::core::language::Language;

        let tc = Toolchain::gnu("gcc").with_flags(Language::C, ["-DPRICE=$5"]);
        let rule = compile_rule(&tc, Language::C).unwrap();
        let mut graph = BuildGraph::new();
        graph
            .add(BuildStep::new(&rule).input("/s/a.c").output("/o/a.c.o"), &rule)
            .unwrap();

        let ninja = render(&graph);
        assert!(ninja.contains("  command = gcc -c '-DPRICE=$$5' $flags"));
    }

    #[test]
    fn test_render_empty_graph() {
        let ninja = render(&BuildGraph::new());
        assert_eq!(
            ninja,
            "# Generated by keel. Do not edit.\nninja_required_version = 1.7\n"
        );
    }
}
