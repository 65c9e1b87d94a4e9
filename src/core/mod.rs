//! Core data structures for Keel.
//!
//! This module contains the declaration-side types:
//! - Typed source/output paths
//! - Languages and dependencies
//! - Targets (object files, libraries, binaries)
//! - Manifests and workspace loading

pub mod dependency;
pub mod language;
pub mod manifest;
pub mod path;
pub mod target;
pub mod workspace;

pub use dependency::{dep, Dependency, LibraryName};
pub use language::Language;
pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
pub use path::{BuildPath, OutputPath, PathRoots, SourcePath};
pub use target::{Binary, Library, ObjectFile, Target};
pub use workspace::Workspace;
