//! Typed build paths.
//!
//! A build path is either rooted in the source tree or in the output tree.
//! Keeping the two apart at the type level means a target can never declare
//! a checked-in file as something the build writes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An absolute path inside the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePath(PathBuf);

/// An absolute path inside the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputPath(PathBuf);

impl SourcePath {
    /// Wrap an absolute source-tree path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourcePath(path.into())
    }

    /// Get the absolute path.
    pub fn absolute(&self) -> &Path {
        &self.0
    }

    /// Append a relative component.
    pub fn join(&self, rel: impl AsRef<Path>) -> SourcePath {
        SourcePath(self.0.join(rel))
    }
}

impl OutputPath {
    /// Wrap an absolute output-tree path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        OutputPath(path.into())
    }

    /// Get the absolute path.
    pub fn absolute(&self) -> &Path {
        &self.0
    }

    /// Append a relative component.
    pub fn join(&self, rel: impl AsRef<Path>) -> OutputPath {
        OutputPath(self.0.join(rel))
    }

    /// Derive a sibling output path with a different extension.
    pub fn with_extension(&self, ext: impl AsRef<str>) -> OutputPath {
        OutputPath(self.0.with_extension(ext.as_ref()))
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.0.extension().and_then(|e| e.to_str())
    }
}

/// A path that is either in the source tree or in the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "tree", content = "path", rename_all = "lowercase")]
pub enum BuildPath {
    Source(SourcePath),
    Output(OutputPath),
}

impl BuildPath {
    /// Get the absolute path, regardless of which tree it lives in.
    pub fn absolute(&self) -> &Path {
        match self {
            BuildPath::Source(p) => p.absolute(),
            BuildPath::Output(p) => p.absolute(),
        }
    }

    /// Get the file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.absolute().extension().and_then(|e| e.to_str())
    }

    /// Check if this path lives in the output tree.
    pub fn is_output(&self) -> bool {
        matches!(self, BuildPath::Output(_))
    }
}

impl From<SourcePath> for BuildPath {
    fn from(p: SourcePath) -> Self {
        BuildPath::Source(p)
    }
}

impl From<OutputPath> for BuildPath {
    fn from(p: OutputPath) -> Self {
        BuildPath::Output(p)
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl fmt::Display for BuildPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.absolute().display())
    }
}

/// The two tree roots a build is laid out in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRoots {
    source_root: PathBuf,
    output_root: PathBuf,
}

impl PathRoots {
    /// Create roots from the source tree and output tree directories.
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        PathRoots {
            source_root: source_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// A source-tree path relative to the source root.
    pub fn source(&self, rel: impl AsRef<Path>) -> SourcePath {
        SourcePath(self.source_root.join(rel))
    }

    /// An output-tree path relative to the output root.
    pub fn output(&self, rel: impl AsRef<Path>) -> OutputPath {
        OutputPath(self.output_root.join(rel))
    }

    /// Path of `path` relative to the root of its own tree.
    ///
    /// Paths that are not under their root are returned unchanged, with any
    /// leading root component stripped so they can still be joined.
    pub fn relative(&self, path: &BuildPath) -> PathBuf {
        let (root, abs) = match path {
            BuildPath::Source(p) => (&self.source_root, p.absolute()),
            BuildPath::Output(p) => (&self.output_root, p.absolute()),
        };
        match abs.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => abs
                .components()
                .filter(|c| matches!(c, std::path::Component::Normal(_)))
                .collect(),
        }
    }

    /// Object file for `source` when compiled as part of `artifact`.
    ///
    /// Objects live next to the artifact in a `<artifact>.p` directory that
    /// mirrors the source layout under `src/` or `gen/`, depending on which
    /// tree the source is in. They keep the source extension so `x.c` and
    /// `x.cpp` never collide.
    pub fn object_for(&self, artifact: &OutputPath, source: &BuildPath) -> OutputPath {
        let tree = match source {
            BuildPath::Source(_) => "src",
            BuildPath::Output(_) => "gen",
        };
        let rel = self.relative(source);
        let ext = match source.extension() {
            Some(ext) => format!("{}.o", ext),
            None => "o".to_string(),
        };
        let dir = format!(
            "{}.p",
            artifact
                .absolute()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        let parent = artifact
            .absolute()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        OutputPath(parent.join(dir).join(tree).join(rel)).with_extension(ext)
    }
}
