//! Build context - the declared targets and the toolchains they build with.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::builder::errors::BuildError;
use crate::builder::graph::{Executor, StepBatch};
use crate::builder::toolchain::{Toolchain, ToolchainRegistry};
use crate::core::path::{OutputPath, PathRoots};
use crate::core::target::{Binary, Library, Target};

/// Everything needed to turn declarations into build steps.
///
/// Targets are registered once and are immutable afterwards. Library names
/// are indexed so dependencies can refer to libraries by name.
pub struct BuildContext {
    registry: ToolchainRegistry,
    roots: PathRoots,
    targets: Vec<Target>,
    by_name: HashMap<String, usize>,
    by_output: HashMap<OutputPath, usize>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("toolchains", &self.registry.len())
            .field("default_toolchain", &self.registry.default_name())
            .field("roots", &self.roots)
            .field("targets", &self.targets.len())
            .finish()
    }
}

impl BuildContext {
    pub fn new(registry: ToolchainRegistry, roots: PathRoots) -> Self {
        BuildContext {
            registry,
            roots,
            targets: Vec::new(),
            by_name: HashMap::new(),
            by_output: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ToolchainRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolchainRegistry {
        &mut self.registry
    }

    pub fn roots(&self) -> &PathRoots {
        &self.roots
    }

    /// Declare a library.
    pub fn add_library(&mut self, library: Library) -> Result<Arc<Library>, BuildError> {
        let library = Arc::new(library);
        self.add(Target::Library(Arc::clone(&library)))?;
        Ok(library)
    }

    /// Declare a binary.
    pub fn add_binary(&mut self, binary: Binary) -> Result<Arc<Binary>, BuildError> {
        let binary = Arc::new(binary);
        self.add(Target::Binary(Arc::clone(&binary)))?;
        Ok(binary)
    }

    fn add(&mut self, target: Target) -> Result<(), BuildError> {
        if self.by_name.contains_key(target.name()) {
            return Err(BuildError::DuplicateTarget {
                name: target.name().to_string(),
            });
        }
        if let Some(&other) = self.by_output.get(target.output()) {
            return Err(BuildError::DuplicateOutput {
                first: self.targets[other].name().to_string(),
                second: target.name().to_string(),
                output: target.output().absolute().to_path_buf(),
            });
        }

        tracing::debug!("declared {} `{}`", target.kind(), target.name());
        let index = self.targets.len();
        self.by_name.insert(target.name().to_string(), index);
        self.by_output.insert(target.output().clone(), index);
        self.targets.push(target);
        Ok(())
    }

    /// Look up a declared library by name.
    pub fn library(&self, name: &str) -> Option<&Arc<Library>> {
        match self.target(name)? {
            Target::Library(lib) => Some(lib),
            Target::Binary(_) => None,
        }
    }

    /// Look up a declared binary by name.
    pub fn binary(&self, name: &str) -> Option<&Arc<Binary>> {
        match self.target(name)? {
            Target::Binary(bin) => Some(bin),
            Target::Library(_) => None,
        }
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.by_name.get(name).map(|&i| &self.targets[i])
    }

    /// All targets, in declaration order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// The toolchain a target builds with: its override if it names one,
    /// otherwise the registry's selected toolchain.
    pub fn toolchain_for(&self, name: Option<&str>) -> Result<Arc<Toolchain>, BuildError> {
        match name {
            Some(name) => self.registry.lookup(name),
            None => self.registry.selected(),
        }
    }

    /// Plan one target into a batch of steps.
    pub fn plan_target(&self, target: &Target) -> Result<StepBatch, BuildError> {
        let mut batch = StepBatch::new();
        target.build(self, &mut batch)?;
        tracing::debug!("planned `{}`: {} steps", target.name(), batch.len());
        Ok(batch)
    }

    /// Emit the steps of the named targets, or of every target if `names`
    /// is empty.
    ///
    /// Targets are planned in parallel and handed to `exec` in declaration
    /// order. If any target fails to plan, nothing is emitted.
    pub fn build_all(&self, names: &[String], exec: &mut dyn Executor) -> Result<usize, BuildError> {
        let selected: Vec<&Target> = if names.is_empty() {
            self.targets.iter().collect()
        } else {
            let mut selected = Vec::with_capacity(names.len());
            for name in names {
                let target = self.target(name).ok_or_else(|| BuildError::UnknownTarget {
                    name: name.clone(),
                })?;
                selected.push(target);
            }
            selected.sort_by_key(|t| self.by_name[t.name()]);
            selected.dedup_by_key(|t| t.name().to_string());
            selected
        };

        tracing::info!("planning {} targets", selected.len());

        let batches = selected
            .par_iter()
            .map(|target| self.plan_target(target))
            .collect::<Result<Vec<_>, BuildError>>()?;

        let count = selected.len();
        let mut all = StepBatch::new();
        for batch in batches {
            all.entries.extend(batch.entries);
        }
        all.flush(exec)?;
        Ok(count)
    }
}

/// Configure the global thread pool used for planning.
pub fn set_jobs(jobs: Option<usize>) {
    if let Some(j) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(j)
            .build_global()
            .ok(); // Ignore if already set
    }
}
