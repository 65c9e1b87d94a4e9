//! Host toolchain detection.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use super::{Tool, Toolchain};

/// Name the detected toolchain is registered under.
pub const HOST_TOOLCHAIN: &str = "host";

/// Detect a GNU-style toolchain on the host.
///
/// Tool priority:
/// 1. Environment variables (CC, CXX, AS, AR, LD)
/// 2. PATH search (cc/gcc/clang, c++/g++/clang++, ar/llvm-ar)
///
/// CFLAGS, CXXFLAGS, ASFLAGS and LDFLAGS are taken from the environment.
pub fn detect_host_toolchain() -> Result<Toolchain> {
    match detect_with(
        |key| std::env::var(key).ok(),
        |name| which::which(name).ok(),
    ) {
        Some(toolchain) => {
            tracing::info!(
                "detected host toolchain: cc={}, cxx={}, ar={}",
                toolchain.cc.display(),
                toolchain.cxx.display(),
                toolchain.ar.display()
            );
            Ok(toolchain)
        }
        None => bail!(
            "no C compiler found\n\
             \n\
             Set the CC environment variable, declare a [toolchain.<name>] table\n\
             in Keel.toml, or install a compiler."
        ),
    }
}

/// Detect a toolchain using the given environment and PATH lookups.
pub fn detect_with(
    env: impl Fn(&str) -> Option<String>,
    find: impl Fn(&str) -> Option<PathBuf>,
) -> Option<Toolchain> {
    let from_env = |key: &str| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
    let search = |candidates: &[&str]| candidates.iter().find_map(|c| find(c));

    let cc = from_env("CC").or_else(|| search(&["cc", "gcc", "clang"]))?;

    let cxx = from_env("CXX")
        .or_else(|| find(&infer_cxx(&cc).to_string_lossy()))
        .or_else(|| search(&["c++", "g++", "clang++"]))
        .unwrap_or_else(|| infer_cxx(&cc));

    let ar = match from_env("AR").or_else(|| search(&["ar", "llvm-ar"])) {
        Some(ar) => ar,
        None => {
            tracing::warn!("archiver (ar) not found");
            PathBuf::new()
        }
    };

    let asm = from_env("AS").unwrap_or_else(|| cc.clone());
    let ld = from_env("LD").unwrap_or_else(|| cxx.clone());

    let flags = |key: &str| -> Vec<String> {
        env(key)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    };

    let mut toolchain = Toolchain::new(HOST_TOOLCHAIN)
        .with_tool(Tool::CCompiler, cc)
        .with_tool(Tool::CxxCompiler, cxx)
        .with_tool(Tool::Assembler, asm)
        .with_tool(Tool::Archiver, ar)
        .with_tool(Tool::Linker, ld);
    toolchain.cflags = flags("CFLAGS");
    toolchain.cxxflags = flags("CXXFLAGS");
    toolchain.asflags = flags("ASFLAGS");
    toolchain.ldflags = flags("LDFLAGS");

    Some(toolchain)
}

/// Infer C++ compiler path from C compiler path.
///
/// Handles common patterns:
/// - gcc, x86_64-linux-gnu-gcc -> g++, x86_64-linux-gnu-g++
/// - clang -> clang++
/// - cc, /usr/bin/cc -> c++, /usr/bin/c++
pub fn infer_cxx(cc: &Path) -> PathBuf {
    let cc_str = cc.to_string_lossy();

    if cc_str.ends_with("gcc") {
        return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 2]));
    }

    if cc_str.ends_with("clang") {
        return PathBuf::from(format!("{}++", cc_str));
    }

    // Only match "cc" when it's a complete basename (not "mycc")
    let is_standalone_cc = cc_str == "cc"
        || cc_str.ends_with("/cc")
        || cc_str.ends_with("\\cc")
        || cc_str.ends_with("-cc");

    if is_standalone_cc {
        return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 1]));
    }

    PathBuf::from(format!("{}++", cc_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_infer_cxx() {
        assert_eq!(infer_cxx(Path::new("gcc")), PathBuf::from("g++"));
        assert_eq!(
            infer_cxx(Path::new("x86_64-linux-gnu-gcc")),
            PathBuf::from("x86_64-linux-gnu-g++")
        );
        assert_eq!(infer_cxx(Path::new("clang")), PathBuf::from("clang++"));
        assert_eq!(infer_cxx(Path::new("/usr/bin/cc")), PathBuf::from("/usr/bin/c++"));
        assert_eq!(infer_cxx(Path::new("tcc")), PathBuf::from("tcc++"));
    }

    #[test]
    fn test_detect_from_env() {
        let env = env_of(&[
            ("CC", "/opt/cc/bin/clang"),
            ("AR", "/opt/cc/bin/llvm-ar"),
            ("CFLAGS", "-O2  -g"),
        ]);
        let tc = detect_with(|k| env.get(k).cloned(), |_| None).unwrap();

        assert_eq!(tc.name, HOST_TOOLCHAIN);
        assert_eq!(tc.cc, PathBuf::from("/opt/cc/bin/clang"));
        assert_eq!(tc.cxx, PathBuf::from("/opt/cc/bin/clang++"));
        assert_eq!(tc.asm, PathBuf::from("/opt/cc/bin/clang"));
        assert_eq!(tc.ld, PathBuf::from("/opt/cc/bin/clang++"));
        assert_eq!(tc.ar, PathBuf::from("/opt/cc/bin/llvm-ar"));
        assert_eq!(tc.cflags, ["-O2", "-g"]);
    }

    #[test]
    fn test_detect_from_path() {
        let tc = detect_with(
            |_| None,
            |name| match name {
                "gcc" | "g++" | "ar" => Some(PathBuf::from("/usr/bin").join(name)),
                _ => None,
            },
        )
        .unwrap();

        assert_eq!(tc.cc, PathBuf::from("/usr/bin/gcc"));
        assert_eq!(tc.cxx, PathBuf::from("/usr/bin/g++"));
        assert_eq!(tc.ar, PathBuf::from("/usr/bin/ar"));
    }

    #[test]
    fn test_detect_without_compiler() {
        assert!(detect_with(|_| None, |_| None).is_none());
    }

    #[test]
    fn test_missing_archiver_is_left_empty() {
        let env = env_of(&[("CC", "gcc")]);
        let tc = detect_with(|k| env.get(k).cloned(), |_| None).unwrap();
        assert!(tc.ar.as_os_str().is_empty());
    }
}
