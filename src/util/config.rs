//! Toolchain configuration files.
//!
//! Toolchains can be declared outside the project manifest:
//! - Global: `~/.keel/toolchain.toml` - user-wide toolchains
//! - Project: `.keel/toolchain.toml` - project-specific overrides
//!
//! Both files hold the same `[toolchain.<name>]` tables as `Keel.toml`.
//! Project config takes precedence over global config, field by field.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::toolchain::{Tool, Toolchain};
use crate::core::dependency::{dep, LibraryName};
use crate::core::language::Language;

/// A set of named toolchain declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    pub toolchain: BTreeMap<String, ToolchainSettings>,
}

/// One `[toolchain.<name>]` table.
///
/// Unset tools fall back to the GNU driver names (`gcc`, `g++`, `ar`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ToolchainSettings {
    /// Make this the default toolchain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,

    /// C compiler (e.g., /usr/bin/clang)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<PathBuf>,

    /// C++ compiler (e.g., /usr/bin/clang++)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxx: Option<PathBuf>,

    /// Assembler driver
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub asm: Option<PathBuf>,

    /// Archiver (e.g., /usr/bin/llvm-ar)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ar: Option<PathBuf>,

    /// Linker driver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ld: Option<PathBuf>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cxxflags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub asflags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldflags: Vec<String>,

    /// Names of libraries every target built with this toolchain links
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stddeps: Vec<String>,

    /// Linker scripts, relative to the project root
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldscripts: Vec<PathBuf>,
}

impl ToolchainSettings {
    /// Merge another table into this one (other takes precedence).
    ///
    /// Lists are replaced, not appended.
    pub fn merge(&mut self, other: ToolchainSettings) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        fn take_list<T>(slot: &mut Vec<T>, value: Vec<T>) {
            if !value.is_empty() {
                *slot = value;
            }
        }

        take(&mut self.default, other.default);
        take(&mut self.cc, other.cc);
        take(&mut self.cxx, other.cxx);
        take(&mut self.asm, other.asm);
        take(&mut self.ar, other.ar);
        take(&mut self.ld, other.ld);
        take_list(&mut self.cflags, other.cflags);
        take_list(&mut self.cxxflags, other.cxxflags);
        take_list(&mut self.asflags, other.asflags);
        take_list(&mut self.ldflags, other.ldflags);
        take_list(&mut self.stddeps, other.stddeps);
        take_list(&mut self.ldscripts, other.ldscripts);
    }

    pub fn is_default(&self) -> bool {
        self.default.unwrap_or(false)
    }

    /// Build the toolchain named `name`. Relative linker scripts are
    /// resolved against `base_dir`.
    pub fn to_toolchain(&self, name: &str, base_dir: &Path) -> Toolchain {
        let mut tc = Toolchain::gnu(name);
        let tools = [
            (Tool::CCompiler, &self.cc),
            (Tool::CxxCompiler, &self.cxx),
            (Tool::Assembler, &self.asm),
            (Tool::Archiver, &self.ar),
            (Tool::Linker, &self.ld),
        ];
        for (tool, path) in tools {
            if let Some(path) = path {
                tc = tc.with_tool(tool, path.clone());
            }
        }

        tc = tc
            .with_flags(Language::C, self.cflags.iter().cloned())
            .with_flags(Language::Cxx, self.cxxflags.iter().cloned())
            .with_flags(Language::Asm, self.asflags.iter().cloned())
            .with_ldflags(self.ldflags.iter().cloned());

        for name in &self.stddeps {
            tc = tc.with_stddep(dep(LibraryName::new(name.clone())));
        }
        for script in &self.ldscripts {
            tc = tc.with_ldscript(base_dir.join(script));
        }
        tc
    }
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load toolchain configuration with fallback to defaults if the file
    /// doesn't exist or is invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "failed to load toolchain config from {}: {:#}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toolchain.is_empty()
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// A layer that marks any toolchain as default replaces the default
    /// chosen by the layers below it.
    pub fn merge(&mut self, other: ToolchainConfig) {
        if other.toolchain.values().any(ToolchainSettings::is_default) {
            for settings in self.toolchain.values_mut() {
                settings.default = None;
            }
        }
        for (name, settings) in other.toolchain {
            self.toolchain.entry(name).or_default().merge(settings);
        }
    }
}

/// Load toolchain configuration with proper precedence.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.keel/toolchain.toml)
/// 2. Global config (~/.keel/toolchain.toml)
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    if let Some(global_path) = global_path {
        config.merge(ToolchainConfig::load_or_default(global_path));
    }
    config.merge(ToolchainConfig::load_or_default(project_path));

    config
}

/// Get the global keel config directory (~/.keel).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".keel"))
}

/// Get the global toolchain config path (~/.keel/toolchain.toml).
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("toolchain.toml"))
}

/// Get the project toolchain config path (.keel/toolchain.toml).
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".keel").join("toolchain.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toolchain_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("toolchain.toml");

        std::fs::write(
            &config_path,
            r#"
[toolchain.clang]
default = true
cc = "/usr/bin/clang"
cxx = "/usr/bin/clang++"
ar = "/usr/bin/llvm-ar"
cflags = ["-Wall", "-Wextra"]
cxxflags = ["-std=c++17"]
ldflags = ["-lpthread"]
stddeps = ["rt"]
ldscripts = ["board.ld"]
"#,
        )
        .unwrap();

        let config = ToolchainConfig::load(&config_path).unwrap();
        let clang = &config.toolchain["clang"];
        assert!(clang.is_default());
        assert_eq!(clang.cc, Some(PathBuf::from("/usr/bin/clang")));
        assert_eq!(clang.cflags, vec!["-Wall", "-Wextra"]);

        let tc = clang.to_toolchain("clang", tmp.path());
        assert_eq!(tc.name, "clang");
        assert_eq!(tc.cc, PathBuf::from("/usr/bin/clang"));
        assert_eq!(tc.ar, PathBuf::from("/usr/bin/llvm-ar"));
        // unset tools use the GNU drivers
        assert_eq!(tc.ld, PathBuf::from("g++"));
        assert_eq!(tc.cxxflags, ["-std=c++17"]);
        assert_eq!(tc.stddeps.len(), 1);
        assert_eq!(tc.ldscripts, [tmp.path().join("board.ld")]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = toml::from_str::<ToolchainConfig>("[toolchain.x]\ncompiler = \"cc\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_settings_merge() {
        let mut base = ToolchainSettings {
            cc: Some(PathBuf::from("/usr/bin/gcc")),
            ar: Some(PathBuf::from("/usr/bin/ar")),
            cflags: vec!["-Wall".to_string()],
            ..Default::default()
        };
        base.merge(ToolchainSettings {
            cc: Some(PathBuf::from("/usr/bin/clang")),
            cflags: vec!["-Werror".to_string()],
            ..Default::default()
        });

        assert_eq!(base.cc, Some(PathBuf::from("/usr/bin/clang")));
        assert_eq!(base.ar, Some(PathBuf::from("/usr/bin/ar")));
        // lists are replaced, not merged
        assert_eq!(base.cflags, vec!["-Werror"]);
    }

    #[test]
    fn test_higher_layer_default_wins() {
        let mut config: ToolchainConfig =
            toml::from_str("[toolchain.gcc]\ndefault = true\n").unwrap();
        config.merge(toml::from_str("[toolchain.clang]\ndefault = true\n").unwrap());

        assert!(!config.toolchain["gcc"].is_default());
        assert!(config.toolchain["clang"].is_default());

        // a layer without a default keeps the lower one
        config.merge(toml::from_str("[toolchain.gcc]\ncflags = [\"-O2\"]\n").unwrap());
        assert!(config.toolchain["clang"].is_default());
    }

    #[test]
    fn test_load_toolchain_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[toolchain.gcc]
cc = "/usr/bin/gcc"
ar = "/usr/bin/ar"
cflags = ["-O2"]

[toolchain.arm]
cc = "arm-none-eabi-gcc"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[toolchain.gcc]
cc = "/usr/bin/clang"
cflags = ["-O3"]
"#,
        )
        .unwrap();

        let config = load_toolchain_config(Some(&global_path), &project_path);
        let gcc = &config.toolchain["gcc"];
        assert_eq!(gcc.cc, Some(PathBuf::from("/usr/bin/clang")));
        assert_eq!(gcc.ar, Some(PathBuf::from("/usr/bin/ar")));
        assert_eq!(gcc.cflags, vec!["-O3"]);
        assert!(config.toolchain.contains_key("arm"));
    }

    #[test]
    fn test_missing_files_are_empty() {
        let tmp = TempDir::new().unwrap();
        let config = load_toolchain_config(None, &tmp.path().join("absent.toml"));
        assert!(config.is_empty());
    }
}
