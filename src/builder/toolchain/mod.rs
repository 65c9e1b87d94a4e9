//! Toolchain definitions for C/C++ targets.
//!
//! A toolchain bundles the compiler, assembler, archiver and linker
//! executables with the baseline flags every target built with it receives,
//! and the standard libraries every target implicitly depends on.
//!
//! Toolchains come from, in order of precedence:
//! 1. `[toolchain.<name>]` tables in `Keel.toml`
//! 2. Toolchain config files (`.keel/toolchain.toml`, `~/.keel/toolchain.toml`)
//! 3. Host detection (CC, CXX, AR, ... and PATH search)

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::core::dependency::Dependency;
use crate::core::language::Language;

mod detect;
mod registry;

pub use detect::{detect_host_toolchain, detect_with, infer_cxx};
pub use registry::ToolchainRegistry;

/// The tools a toolchain provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    CCompiler,
    CxxCompiler,
    Assembler,
    Archiver,
    Linker,
}

impl Tool {
    /// Human-readable tool name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::CCompiler => "C compiler",
            Tool::CxxCompiler => "C++ compiler",
            Tool::Assembler => "assembler",
            Tool::Archiver => "archiver",
            Tool::Linker => "linker",
        }
    }

    /// The tool that compiles sources of `lang`.
    pub fn compiler_for(lang: Language) -> Tool {
        match lang {
            Language::C => Tool::CCompiler,
            Language::Cxx => Tool::CxxCompiler,
            Language::Asm => Tool::Assembler,
        }
    }
}

/// A named compiler/assembler/archiver/linker bundle.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Registry name, also the prefix of every rule this toolchain produces
    pub name: String,
    /// C compiler
    pub cc: PathBuf,
    /// C++ compiler
    pub cxx: PathBuf,
    /// Assembler (usually the C compiler driver)
    pub asm: PathBuf,
    /// Static archiver
    pub ar: PathBuf,
    /// Linker driver
    pub ld: PathBuf,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub asflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Libraries every target built with this toolchain depends on
    pub stddeps: Vec<Dependency>,
    /// Default linker scripts, passed as `-T<script>`
    pub ldscripts: Vec<PathBuf>,
}

impl Toolchain {
    /// Create a toolchain with no tools configured.
    pub fn new(name: impl Into<String>) -> Self {
        Toolchain {
            name: name.into(),
            cc: PathBuf::new(),
            cxx: PathBuf::new(),
            asm: PathBuf::new(),
            ar: PathBuf::new(),
            ld: PathBuf::new(),
            cflags: Vec::new(),
            cxxflags: Vec::new(),
            asflags: Vec::new(),
            ldflags: Vec::new(),
            stddeps: Vec::new(),
            ldscripts: Vec::new(),
        }
    }

    /// A GNU toolchain using the tools found on PATH.
    pub fn gnu(name: impl Into<String>) -> Self {
        Toolchain::new(name)
            .with_tool(Tool::CCompiler, "gcc")
            .with_tool(Tool::CxxCompiler, "g++")
            .with_tool(Tool::Assembler, "gcc")
            .with_tool(Tool::Archiver, "ar")
            .with_tool(Tool::Linker, "g++")
    }

    /// Set the path of one tool.
    pub fn with_tool(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match tool {
            Tool::CCompiler => self.cc = path,
            Tool::CxxCompiler => self.cxx = path,
            Tool::Assembler => self.asm = path,
            Tool::Archiver => self.ar = path,
            Tool::Linker => self.ld = path,
        }
        self
    }

    /// Set the baseline flags for one language.
    pub fn with_flags(
        mut self,
        lang: Language,
        flags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let flags = flags.into_iter().map(Into::into).collect();
        match lang {
            Language::C => self.cflags = flags,
            Language::Cxx => self.cxxflags = flags,
            Language::Asm => self.asflags = flags,
        }
        self
    }

    /// Set the baseline linker flags.
    pub fn with_ldflags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ldflags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Add a standard dependency.
    pub fn with_stddep(mut self, dep: Dependency) -> Self {
        self.stddeps.push(dep);
        self
    }

    /// Add a default linker script.
    pub fn with_ldscript(mut self, script: impl Into<PathBuf>) -> Self {
        self.ldscripts.push(script.into());
        self
    }

    /// Get the path of a tool, failing if it is not configured.
    pub fn tool(&self, tool: Tool) -> Result<&Path, BuildError> {
        let path = match tool {
            Tool::CCompiler => &self.cc,
            Tool::CxxCompiler => &self.cxx,
            Tool::Assembler => &self.asm,
            Tool::Archiver => &self.ar,
            Tool::Linker => &self.ld,
        };
        if path.as_os_str().is_empty() {
            return Err(BuildError::MissingTool {
                toolchain: self.name.clone(),
                tool: tool.as_str(),
            });
        }
        Ok(path)
    }

    /// Baseline flags for sources of `lang`.
    pub fn flags_for(&self, lang: Language) -> &[String] {
        match lang {
            Language::C => &self.cflags,
            Language::Cxx => &self.cxxflags,
            Language::Asm => &self.asflags,
        }
    }
}
