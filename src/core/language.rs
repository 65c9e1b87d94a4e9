//! Source languages.
//!
//! The language of a translation unit is derived from its file extension
//! and selects both the compiler and the flag set used to build it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::errors::BuildError;
use crate::core::path::BuildPath;

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C
    C,
    /// C++
    #[serde(alias = "cpp", alias = "c++")]
    Cxx,
    /// Assembly (preprocessed or not)
    #[serde(alias = "as", alias = "assembly")]
    Asm,
}

/// Extension to language table.
const EXTENSIONS: &[(&str, Language)] = &[
    ("c", Language::C),
    ("h", Language::C),
    ("cc", Language::Cxx),
    ("cpp", Language::Cxx),
    ("hh", Language::Cxx),
    ("hpp", Language::Cxx),
    ("s", Language::Asm),
    ("S", Language::Asm),
];

impl Language {
    /// All languages, in rule declaration order.
    pub const ALL: [Language; 3] = [Language::C, Language::Cxx, Language::Asm];

    /// Look up a language by file extension (case-sensitive: `.S` and `.s`
    /// are both assembly, but `.C` is not C).
    pub fn from_extension(ext: &str) -> Option<Language> {
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, lang)| *lang)
    }

    /// Determine the language of a source file.
    pub fn of(path: &BuildPath) -> Result<Language, BuildError> {
        let ext = path.extension();
        ext.and_then(Language::from_extension)
            .ok_or_else(|| BuildError::UnsupportedSource {
                path: path.absolute().to_path_buf(),
                extension: ext.map(str::to_string),
            })
    }

    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
            Language::Asm => "asm",
        }
    }

    /// Suffix of the compile rule name for this language.
    pub fn rule_suffix(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "cxx",
            Language::Asm => "as",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
