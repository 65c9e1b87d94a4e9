//! `pkg-config` flag lookup.
//!
//! The lookup is synchronous and its result is opaque: a list of flag
//! tokens handed to targets unchanged.

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;

/// Compile and link flags of a set of packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgFlags {
    pub cflags: Vec<String>,
    pub libs: Vec<String>,
}

/// Query `pkg-config` for `packages`.
pub fn probe(packages: &[String]) -> Result<PkgFlags> {
    if packages.is_empty() {
        return Ok(PkgFlags::default());
    }
    let program = std::env::var("PKG_CONFIG").unwrap_or_else(|_| "pkg-config".to_string());

    let query = |mode: &str| -> Result<Vec<String>> {
        let out = ProcessBuilder::new(&program)
            .arg(mode)
            .args(packages)
            .exec_stdout()
            .with_context(|| format!("pkg-config lookup failed for {}", packages.join(", ")))?;
        Ok(split_flags(&out))
    };

    let flags = PkgFlags {
        cflags: query("--cflags")?,
        libs: query("--libs")?,
    };
    tracing::debug!(
        "pkg-config {}: cflags={:?} libs={:?}",
        packages.join(" "),
        flags.cflags,
        flags.libs
    );
    Ok(flags)
}

/// Split pkg-config output into tokens.
///
/// Honors backslash escapes and single/double quotes the way pkg-config
/// emits them for paths with spaces.
pub fn split_flags(output: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = output.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    in_token = true;
                }
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_flags() {
        assert_eq!(
            split_flags("-I/usr/include/libpng16 -lpng16 -lz \n"),
            ["-I/usr/include/libpng16", "-lpng16", "-lz"]
        );
        assert_eq!(
            split_flags(r#"-I/opt/my\ lib/include "-DNAME=a b" ''"#),
            ["-I/opt/my lib/include", "-DNAME=a b", ""]
        );
        assert!(split_flags("   \n").is_empty());
    }

    #[test]
    fn test_no_packages_is_empty() {
        assert_eq!(probe(&[]).unwrap(), PkgFlags::default());
    }
}
