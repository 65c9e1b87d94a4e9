//! Build-action synthesis.
//!
//! Targets emit compile, archive and link steps to an [`graph::Executor`].
//! Each step references a rule generated from the toolchain that builds it.

pub mod collect;
pub mod context;
pub mod errors;
pub mod graph;
pub mod ninja;
pub mod rules;
pub mod toolchain;

pub use context::BuildContext;
pub use errors::BuildError;
pub use graph::{BuildGraph, BuildRule, BuildStep, Executor};
pub use toolchain::{Tool, Toolchain, ToolchainRegistry};
