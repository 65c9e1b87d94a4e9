//! Filesystem utilities.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Check whether a pattern contains glob meta-characters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand source patterns relative to a base directory.
///
/// Patterns without meta-characters name a file directly and are kept
/// even if the file does not exist yet. Glob matches are sorted per pattern.
/// The result keeps pattern order and drops repeated paths.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);

        let mut matches = Vec::new();
        if is_glob(pattern) {
            let pattern_str = full_pattern.to_string_lossy();
            for entry in
                glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
            {
                match entry {
                    Ok(path) => {
                        if path.is_file() {
                            matches.push(path);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("glob error: {}", e);
                    }
                }
            }
            if matches.is_empty() {
                tracing::warn!("pattern `{}` matched no files", pattern);
            }
            matches.sort();
        } else {
            matches.push(full_pattern);
        }

        for path in matches {
            if seen.insert(path.clone()) {
                results.push(path);
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("util.c"), "void util() {}").unwrap();
        fs::write(src.join("main.c"), "int main() {}").unwrap();
        fs::write(src.join("sub/deep.c"), "").unwrap();
        fs::write(src.join("readme.txt"), "readme").unwrap();

        let files = glob_files(tmp.path(), &["src/**/*.c".to_string()]).unwrap();
        assert_eq!(files.len(), 3);

        let files = glob_files(tmp.path(), &["src/*.c".to_string()]).unwrap();
        assert_eq!(files, [src.join("main.c"), src.join("util.c")]);
    }

    #[test]
    fn test_literal_patterns_keep_order_and_dedup() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.c"), "").unwrap();
        fs::write(tmp.path().join("b.c"), "").unwrap();

        let patterns = vec![
            "b.c".to_string(),
            "*.c".to_string(),
            "missing.c".to_string(),
        ];
        let files = glob_files(tmp.path(), &patterns).unwrap();
        assert_eq!(
            files,
            [
                tmp.path().join("b.c"),
                tmp.path().join("a.c"),
                tmp.path().join("missing.c"),
            ]
        );
    }

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.txt");
        write_string(&path, "hi").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "hi");
    }
}
