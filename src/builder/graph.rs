//! Build actions handed to the executor.
//!
//! Targets describe their work as [`BuildStep`]s that reference reusable
//! [`BuildRule`]s. An [`Executor`] receives each step together with its
//! rule; it owns rule de-duplication and everything that happens after.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::errors::BuildError;
use crate::util::process::quote;

/// A reusable, named command template.
///
/// Commands use Ninja-style `$name` placeholders: `$in` and `$out` for the
/// step's inputs and outputs, and any step or rule variable by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRule {
    /// Unique name, `<toolchain>-<action>`
    pub name: String,
    /// Command template
    pub command: String,
    /// Short progress description template
    pub description: String,
    /// Extra rule-level variables (e.g. `depfile`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    /// Whether steps using this rule belong in `compile_commands.json`
    #[serde(default)]
    pub compdb: bool,
}

/// One concrete action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    pub outputs: Vec<PathBuf>,
    pub inputs: Vec<PathBuf>,
    /// Name of the rule this step invokes
    pub rule: String,
    /// Values substituted into the rule command
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl BuildStep {
    /// Create a step for `rule`.
    pub fn new(rule: &BuildRule) -> Self {
        BuildStep {
            outputs: Vec::new(),
            inputs: Vec::new(),
            rule: rule.name.clone(),
            variables: BTreeMap::new(),
        }
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Receives synthesized build actions.
pub trait Executor {
    /// Accept one step and the rule it references.
    fn add(&mut self, step: BuildStep, rule: &BuildRule) -> Result<(), BuildError>;

    /// Accept every step of `batch`, in order.
    ///
    /// Executors that can undo work override this so a rejected step leaves
    /// no part of the batch behind.
    fn add_batch(&mut self, batch: StepBatch) -> Result<(), BuildError> {
        for (step, rule) in batch.entries {
            self.add(step, &rule)?;
        }
        Ok(())
    }
}

/// Steps of one target, buffered until the target is fully planned.
#[derive(Debug, Clone, Default)]
pub struct StepBatch {
    pub entries: Vec<(BuildStep, BuildRule)>,
}

impl StepBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand every buffered step to `exec`, in order.
    pub fn flush(self, exec: &mut dyn Executor) -> Result<(), BuildError> {
        exec.add_batch(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Executor for StepBatch {
    fn add(&mut self, step: BuildStep, rule: &BuildRule) -> Result<(), BuildError> {
        self.entries.push((step, rule.clone()));
        Ok(())
    }
}

/// An in-memory executor that records the complete build graph.
///
/// Rules are de-duplicated by name (first definition wins; a different
/// definition under the same name is an internal error), and every output
/// may be produced by only one step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildGraph {
    /// Distinct rules, in first-use order
    pub rules: Vec<BuildRule>,
    /// All steps, in the order they were added
    pub steps: Vec<BuildStep>,
    #[serde(skip)]
    rule_index: HashMap<String, usize>,
    #[serde(skip)]
    producers: HashMap<PathBuf, usize>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&BuildRule> {
        self.rule_index.get(name).map(|&i| &self.rules[i])
    }

    /// The step producing `output`, if any.
    pub fn producer(&self, output: &Path) -> Option<&BuildStep> {
        self.producers.get(output).map(|&i| &self.steps[i])
    }

    /// Steps invoking the rule named `rule`.
    pub fn steps_for_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a BuildStep> {
        self.steps.iter().filter(move |s| s.rule == rule)
    }

    /// Expand a rule command for one of its steps.
    pub fn command_line(&self, step: &BuildStep) -> Option<String> {
        let rule = self.rule(&step.rule)?;
        Some(expand(&rule.command, step, rule))
    }

    /// Serialize the graph as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Build `compile_commands.json` entries for every step whose rule
    /// feeds the compilation database.
    pub fn compile_commands(&self, directory: &Path) -> Vec<CompileCommand> {
        self.steps
            .iter()
            .filter_map(|step| {
                let rule = self.rule(&step.rule)?;
                if !rule.compdb {
                    return None;
                }
                Some(CompileCommand {
                    directory: directory.display().to_string(),
                    file: step.inputs.first()?.display().to_string(),
                    command: expand(&rule.command, step, rule),
                    output: step.outputs.first().map(|p| p.display().to_string()),
                })
            })
            .collect()
    }
}

impl Executor for BuildGraph {
    fn add(&mut self, step: BuildStep, rule: &BuildRule) -> Result<(), BuildError> {
        if step.rule != rule.name {
            return Err(BuildError::Internal(format!(
                "step references rule `{}` but was submitted with `{}`",
                step.rule, rule.name
            )));
        }

        let known = match self.rule_index.get(&rule.name) {
            Some(&i) if self.rules[i] != *rule => {
                return Err(BuildError::Internal(format!(
                    "conflicting definitions for rule `{}`",
                    rule.name
                )));
            }
            Some(_) => true,
            None => false,
        };

        for (i, output) in step.outputs.iter().enumerate() {
            if self.producers.contains_key(output) || step.outputs[..i].contains(output) {
                return Err(BuildError::Internal(format!(
                    "`{}` is produced by more than one step",
                    output.display()
                )));
            }
        }

        if !known {
            tracing::debug!("declaring rule `{}`", rule.name);
            self.rule_index.insert(rule.name.clone(), self.rules.len());
            self.rules.push(rule.clone());
        }
        let index = self.steps.len();
        for output in &step.outputs {
            self.producers.insert(output.clone(), index);
        }
        self.steps.push(step);
        Ok(())
    }

    fn add_batch(&mut self, batch: StepBatch) -> Result<(), BuildError> {
        let (rules, steps) = (self.rules.len(), self.steps.len());
        for (step, rule) in batch.entries {
            if let Err(err) = self.add(step, &rule) {
                self.truncate(rules, steps);
                return Err(err);
            }
        }
        Ok(())
    }
}

impl BuildGraph {
    /// Drop every rule and step added after the given counts.
    fn truncate(&mut self, rules: usize, steps: usize) {
        self.rules.truncate(rules);
        self.steps.truncate(steps);
        self.rule_index.retain(|_, &mut i| i < rules);
        self.producers.retain(|_, &mut i| i < steps);
    }
}

/// compile_commands.json entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Substitute `$in`, `$out` and variables into a command template.
///
/// Step variables take precedence over rule variables and are substituted
/// literally; rule variables are themselves expanded. `$$` is a literal
/// dollar sign and `${name}` is accepted for names followed by identifier
/// characters. Unknown variables expand to nothing, as in Ninja.
pub fn expand(template: &str, step: &BuildStep, rule: &BuildRule) -> String {
    let lookup = |name: &str| -> String {
        match name {
            "in" => join_paths(&step.inputs),
            "out" => join_paths(&step.outputs),
            _ => match step.variables.get(name) {
                Some(value) => value.clone(),
                None => rule
                    .variables
                    .get(name)
                    .map(|v| expand(v, step, &BuildRule { variables: BTreeMap::new(), ..rule.clone() }))
                    .unwrap_or_default(),
            },
        }
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some((_, '$')) => {
                chars.next();
                out.push('$');
            }
            Some((_, '{')) => {
                chars.next();
                let start = i + 2;
                let mut end = start;
                for (j, c) in chars.by_ref() {
                    if c == '}' {
                        end = j;
                        break;
                    }
                    end = j + c.len_utf8();
                }
                out.push_str(&lookup(&template[start..end]));
            }
            Some((start, c)) if is_var_char(c) => {
                let mut end = start;
                while let Some(&(j, c)) = chars.peek() {
                    if !is_var_char(c) {
                        break;
                    }
                    end = j + c.len_utf8();
                    chars.next();
                }
                out.push_str(&lookup(&template[start..end]));
            }
            _ => out.push('$'),
        }
    }
    out
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| quote(&p.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}
