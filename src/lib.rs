//! Keel - typed C/C++ target definitions.
//!
//! Targets (object files, static libraries, binaries) are declared with
//! typed source-tree and output-tree paths. Resolving a target walks its
//! library dependencies, and building it emits compile, archive and link
//! actions to an [`builder::graph::Executor`], which the `keel` binary
//! renders as a Ninja file, a JSON plan or `compile_commands.json`.

pub mod builder;
pub mod core;
pub mod util;

pub use builder::{BuildContext, BuildError, BuildGraph, Toolchain, ToolchainRegistry};
pub use core::{
    dependency::Dependency, manifest::Manifest, target::Target, workspace::Workspace,
};
