//! Named toolchains and the default selection.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::builder::errors::BuildError;

use super::Toolchain;

/// All toolchains known to a build, with exactly one default.
///
/// The registry is an ordinary value threaded through the build; there is
/// no process-wide toolchain state.
#[derive(Debug, Clone, Default)]
pub struct ToolchainRegistry {
    toolchains: BTreeMap<String, Arc<Toolchain>>,
    default: Option<String>,
    requested: Option<String>,
}

impl ToolchainRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toolchain, replacing any toolchain with the same name.
    pub fn register(&mut self, toolchain: Toolchain) -> Arc<Toolchain> {
        let toolchain = Arc::new(toolchain);
        if self
            .toolchains
            .insert(toolchain.name.clone(), Arc::clone(&toolchain))
            .is_some()
        {
            tracing::debug!("replaced toolchain `{}`", toolchain.name);
        }
        toolchain
    }

    /// Add a toolchain and make it the default.
    pub fn register_as_default(&mut self, toolchain: Toolchain) -> Arc<Toolchain> {
        let toolchain = self.register(toolchain);
        self.default = Some(toolchain.name.clone());
        toolchain
    }

    /// Get the default toolchain.
    pub fn default_toolchain(&self) -> Result<Arc<Toolchain>, BuildError> {
        let name = self.default.as_ref().ok_or(BuildError::NoDefaultToolchain)?;
        self.lookup(name)
    }

    /// Get a toolchain by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<Toolchain>, BuildError> {
        self.toolchains
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::ToolchainNotFound {
                name: name.to_string(),
            })
    }

    /// Request a toolchain for targets without an explicit override.
    ///
    /// The request is only recorded here; `selected()` reports it.
    pub fn select(&mut self, name: impl Into<String>) {
        self.requested = Some(name.into());
    }

    /// The toolchain used by targets that do not name one.
    ///
    /// This is always the default. Requesting any other toolchain is not
    /// supported and fails instead of silently building with the default.
    pub fn selected(&self) -> Result<Arc<Toolchain>, BuildError> {
        let default = self.default_toolchain()?;
        match &self.requested {
            Some(requested) if *requested != default.name => {
                Err(BuildError::ToolchainSelectionUnsupported {
                    requested: requested.clone(),
                    default: default.name.clone(),
                })
            }
            _ => Ok(default),
        }
    }

    /// Name of the default toolchain, if any.
    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Iterate over all toolchains, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Toolchain>> {
        self.toolchains.values()
    }

    pub fn len(&self) -> usize {
        self.toolchains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolchains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_lookup() {
        let mut reg = ToolchainRegistry::new();
        reg.register(Toolchain::gnu("cross"));
        reg.register_as_default(Toolchain::gnu("host"));

        assert_eq!(reg.default_toolchain().unwrap().name, "host");
        assert_eq!(reg.lookup("cross").unwrap().name, "cross");
        assert_eq!(reg.selected().unwrap().name, "host");
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_no_default() {
        let mut reg = ToolchainRegistry::new();
        reg.register(Toolchain::gnu("cross"));
        assert!(matches!(
            reg.selected(),
            Err(BuildError::NoDefaultToolchain)
        ));
    }

    #[test]
    fn test_register_overwrites() {
        let mut reg = ToolchainRegistry::new();
        reg.register_as_default(Toolchain::gnu("host"));
        reg.register(Toolchain::gnu("host").with_ldflags(["-static"]));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.default_toolchain().unwrap().ldflags, ["-static"]);
    }

    #[test]
    fn test_unknown_lookup() {
        let reg = ToolchainRegistry::new();
        assert!(matches!(
            reg.lookup("nope"),
            Err(BuildError::ToolchainNotFound { ref name }) if name == "nope"
        ));
    }

    #[test]
    fn test_selecting_non_default_fails_loudly() {
        let mut reg = ToolchainRegistry::new();
        reg.register_as_default(Toolchain::gnu("host"));
        reg.register(Toolchain::gnu("cross"));

        reg.select("host");
        assert_eq!(reg.selected().unwrap().name, "host");

        reg.select("cross");
        let err = reg.selected().unwrap_err();
        assert!(matches!(
            err,
            BuildError::ToolchainSelectionUnsupported { ref requested, ref default }
                if requested == "cross" && default == "host"
        ));
    }
}
