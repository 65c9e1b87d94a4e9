//! Library dependencies.
//!
//! A dependency is anything that can produce a [`Library`] for the toolchain
//! a target is being built with. Targets never inspect what kind of value
//! they depend on; they only ask it to resolve.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::toolchain::Toolchain;
use crate::core::target::Library;

/// Everything a dependency may consult while resolving.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    build: &'a BuildContext,
    toolchain: &'a Arc<Toolchain>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(build: &'a BuildContext, toolchain: &'a Arc<Toolchain>) -> Self {
        ResolveContext { build, toolchain }
    }

    /// The toolchain the depending target is built with.
    pub fn toolchain(&self) -> &'a Arc<Toolchain> {
        self.toolchain
    }

    /// The build the depending target belongs to.
    pub fn build(&self) -> &'a BuildContext {
        self.build
    }
}

impl fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("toolchain", &self.toolchain.name)
            .finish_non_exhaustive()
    }
}

/// The capability of turning into a library for a given toolchain.
pub trait LibraryResolvable: fmt::Debug + Send + Sync {
    fn resolve(&self, cx: &ResolveContext<'_>) -> Result<Arc<Library>, BuildError>;
}

/// A shared dependency value.
pub type Dependency = Arc<dyn LibraryResolvable>;

impl LibraryResolvable for Library {
    fn resolve(&self, _cx: &ResolveContext<'_>) -> Result<Arc<Library>, BuildError> {
        Ok(Arc::new(self.clone()))
    }
}

impl LibraryResolvable for Arc<Library> {
    fn resolve(&self, _cx: &ResolveContext<'_>) -> Result<Arc<Library>, BuildError> {
        Ok(Arc::clone(self))
    }
}

/// A reference to a declared library by name.
///
/// Names are looked up when the dependency is resolved, so libraries can be
/// declared in any order (and a cyclic declaration is reported as a cycle
/// rather than being impossible to express).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryName(pub String);

impl LibraryName {
    pub fn new(name: impl Into<String>) -> Self {
        LibraryName(name.into())
    }
}

impl LibraryResolvable for LibraryName {
    fn resolve(&self, cx: &ResolveContext<'_>) -> Result<Arc<Library>, BuildError> {
        cx.build()
            .library(&self.0)
            .cloned()
            .ok_or_else(|| BuildError::UnknownDependency {
                name: self.0.clone(),
            })
    }
}

/// A dependency that picks a different library per toolchain.
#[derive(Debug, Clone, Default)]
pub struct PerToolchain {
    variants: BTreeMap<String, Dependency>,
    fallback: Option<Dependency>,
}

impl PerToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dep` when building with the toolchain named `toolchain`.
    pub fn with_variant(mut self, toolchain: impl Into<String>, dep: Dependency) -> Self {
        self.variants.insert(toolchain.into(), dep);
        self
    }

    /// Use `dep` for every toolchain without a variant.
    pub fn with_fallback(mut self, dep: Dependency) -> Self {
        self.fallback = Some(dep);
        self
    }
}

impl LibraryResolvable for PerToolchain {
    fn resolve(&self, cx: &ResolveContext<'_>) -> Result<Arc<Library>, BuildError> {
        let name = &cx.toolchain().name;
        match self.variants.get(name).or(self.fallback.as_ref()) {
            Some(dep) => dep.resolve(cx),
            None => Err(BuildError::UnknownDependency {
                name: format!("<no variant for toolchain `{}`>", name),
            }),
        }
    }
}

/// Wrap a value as a shared dependency.
pub fn dep(value: impl LibraryResolvable + 'static) -> Dependency {
    Arc::new(value)
}
