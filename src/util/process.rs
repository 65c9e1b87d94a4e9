//! Subprocess execution and shell quoting.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());

        cmd.output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))
    }

    /// Execute and return stdout, failing on a non-zero exit.
    pub fn exec_stdout(&self) -> Result<String> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with {}\n{}",
                self.display_command(),
                output.status,
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Render the command line for messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![quote(&self.program.to_string_lossy())];
        parts.extend(quote_all(&self.args));
        parts.join(" ")
    }
}

/// Quote one argument for a POSIX shell.
///
/// Commands always run through `/bin/sh`, so Unix quoting applies on every
/// host. Arguments made only of safe characters are returned unchanged.
pub fn quote(arg: &str) -> String {
    shell_escape::unix::escape(Cow::Borrowed(arg)).into_owned()
}

/// Quote every argument.
pub fn quote_all<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter().map(|a| quote(a.as_ref())).collect()
}

/// Quote and join arguments with spaces.
pub fn join(args: &[impl AsRef<str>]) -> String {
    quote_all(args).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("-I/usr/include"), "-I/usr/include");
        assert_eq!(quote("-DNAME=value"), "-DNAME=value");
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&["-O2", "-DMSG=hi there"]), "-O2 '-DMSG=hi there'");
        let empty: [&str; 0] = [];
        assert_eq!(join(&empty), "");
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("pkg-config").args(["--cflags", "zlib"]);
        assert_eq!(pb.display_command(), "pkg-config --cflags zlib");
        assert_eq!(pb.get_args(), ["--cflags", "zlib"]);
    }
}
