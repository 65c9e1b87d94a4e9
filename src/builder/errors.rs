//! Build-graph error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::builder::collect::CycleError;
use crate::core::path::OutputPath;
use crate::util::diagnostic::Diagnostic;

/// Error while declaring targets or synthesizing build actions.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A target declaration has a field of the wrong shape.
    #[error("in target `{target}`: `{field}` must be {expected}")]
    InvalidDeclaration {
        target: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("target `{name}` is declared more than once")]
    DuplicateTarget { name: String },

    #[error("targets `{first}` and `{second}` both produce `{}`", .output.display())]
    DuplicateOutput {
        first: String,
        second: String,
        output: PathBuf,
    },

    #[error("no target named `{name}`")]
    UnknownTarget { name: String },

    #[error("dependency `{name}` does not name a declared library")]
    UnknownDependency { name: String },

    #[error("dependency cycle detected at `{}`", .path.display())]
    DependencyCycle { path: PathBuf, chain: Vec<PathBuf> },

    #[error("unsupported source type for `{}`{}", .path.display(), extension_note(.extension))]
    UnsupportedSource {
        path: PathBuf,
        extension: Option<String>,
    },

    #[error("no default toolchain is registered")]
    NoDefaultToolchain,

    #[error("toolchain `{name}` is not registered")]
    ToolchainNotFound { name: String },

    #[error("selecting toolchain `{requested}` is not supported; only the default toolchain `{default}` can be used")]
    ToolchainSelectionUnsupported { requested: String, default: String },

    #[error("toolchain `{toolchain}` has no {tool} configured")]
    MissingTool {
        toolchain: String,
        tool: &'static str,
    },

    /// An invariant of this crate was violated. Never caused by user input.
    #[error("internal error: {0}")]
    Internal(String),
}

fn extension_note(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!(" (extension `.{}`)", ext),
        None => " (no extension)".to_string(),
    }
}

impl From<CycleError<OutputPath>> for BuildError {
    fn from(err: CycleError<OutputPath>) -> Self {
        BuildError::DependencyCycle {
            path: err.key.absolute().to_path_buf(),
            chain: err
                .chain
                .iter()
                .map(|p| p.absolute().to_path_buf())
                .collect(),
        }
    }
}

impl BuildError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            BuildError::InvalidDeclaration { target, .. } => diag
                .with_suggestion(format!("Fix the declaration of `{}` in Keel.toml", target)),

            BuildError::DuplicateTarget { .. } => {
                diag.with_suggestion("Target names must be unique across all modules")
            }

            BuildError::DuplicateOutput { .. } => {
                diag.with_suggestion("Give each target its own `output`")
            }

            BuildError::UnknownTarget { .. } => {
                diag.with_suggestion("Run `keel plan --format json` to list every target")
            }

            BuildError::UnknownDependency { .. } => diag
                .with_suggestion("Declare the library with [[library]] in one of the modules")
                .with_suggestion("Check that the module is listed in [project] modules"),

            BuildError::DependencyCycle { chain, .. } => {
                let chain: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
                diag.with_context(format!("cycle: {}", chain.join(" -> ")))
                    .with_suggestion("Break the cycle by removing or restructuring dependencies")
            }

            BuildError::UnsupportedSource { .. } => diag.with_context(
                "recognized extensions: .c .h (C), .cc .cpp .hh .hpp (C++), .s .S (assembly)",
            ),

            BuildError::NoDefaultToolchain => diag
                .with_suggestion("Mark a toolchain with `default = true`")
                .with_suggestion("Set CC so a host toolchain can be detected"),

            BuildError::ToolchainNotFound { .. } => {
                diag.with_suggestion("Run `keel toolchain show` to list registered toolchains")
            }

            BuildError::ToolchainSelectionUnsupported { .. } => {
                diag.with_suggestion("Drop --toolchain, or mark the toolchain as the default")
            }

            BuildError::MissingTool { toolchain, tool } => diag.with_suggestion(format!(
                "Set the {} path in [toolchain.{}]",
                tool, toolchain
            )),

            BuildError::Internal(_) => diag.with_context("this is a bug in keel"),
        }
    }
}
