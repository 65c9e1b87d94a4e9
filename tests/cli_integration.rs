//! CLI integration tests for Keel.
//!
//! Every project declares its own toolchain so nothing depends on the host
//! compiler, and HOME points into the temp dir so no global config leaks in.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the keel binary command, running inside `dir`.
fn keel(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("keel").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("KEEL_MANIFEST_PATH");
    cmd
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A two-module project: `app` links `net`, which depends on `core`.
fn create_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    write(
        dir,
        "Keel.toml",
        r#"
[project]
name = "demo"
modules = ["lib", "app"]

[toolchain.gcc]
default = true
cflags = ["-O2"]
"#,
    );
    write(
        dir,
        "lib/Keel.toml",
        r#"
[[library]]
name = "core"
output = "libcore.a"
sources = ["core/*.c"]
always-link = true

[[library]]
name = "net"
output = "libnet.a"
sources = ["net/socket.c"]
deps = ["core"]
includes = ["net"]
"#,
    );
    write(dir, "lib/core/alloc.c", "int alloc(void) { return 0; }\n");
    write(dir, "lib/core/log.c", "int log_it(void) { return 0; }\n");
    write(dir, "lib/net/socket.c", "int sock(void) { return 0; }\n");
    write(
        dir,
        "app/Keel.toml",
        r#"
[[binary]]
name = "app"
output = "app"
sources = ["main.cpp"]
deps = ["net"]
ldflags-post = ["-lm"]
"#,
    );
    write(dir, "app/main.cpp", "int main() { return 0; }\n");
    tmp
}

// ============================================================================
// keel plan
// ============================================================================

#[test]
fn test_plan_writes_ninja_file() {
    let tmp = create_project();

    keel(tmp.path())
        .arg("plan")
        .assert()
        .success()
        .stderr(predicate::str::contains("Planned 3 targets"));

    let ninja = fs::read_to_string(tmp.path().join("build/build.ninja")).unwrap();
    assert!(ninja.starts_with("# Generated by keel"));
    assert!(ninja.contains("rule gcc-c\n"));
    assert!(ninja.contains("rule gcc-cxx\n"));
    assert!(ninja.contains("rule gcc-ar\n"));
    assert!(ninja.contains("rule gcc-ld\n"));
    assert!(ninja.contains("  command = gcc -c -O2 $flags -o $out -MD -MF $out.d -pipe $in\n"));
    assert!(ninja.contains("rcsT $out $in"));
    assert_eq!(ninja.matches("\nbuild ").count(), 7);
}

#[test]
fn test_plan_json_to_stdout() {
    let tmp = create_project();

    let output = keel(tmp.path())
        .args(["plan", "--format", "json", "-o", "-", "--target", "net"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let steps = plan["steps"].as_array().unwrap();
    // socket.c.o and libnet.a; core is not planned
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1]["rule"], "gcc-ar");
}

#[test]
fn test_plan_unknown_target() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["plan", "--target", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no target named `nope`"));

    assert!(!tmp.path().join("build/build.ninja").exists());
}

#[test]
fn test_plan_fails_without_manifest() {
    let tmp = TempDir::new().unwrap();

    keel(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Keel.toml`"));
}

#[test]
fn test_plan_from_module_directory() {
    let tmp = create_project();

    keel(&tmp.path().join("lib"))
        .args(["plan", "-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build "));
}

#[test]
fn test_cycle_is_reported() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "Keel.toml",
        r#"
[project]
name = "loop"

[toolchain.gcc]

[[library]]
name = "a"
output = "liba.a"
sources = ["a.c"]
deps = ["b"]

[[library]]
name = "b"
output = "libb.a"
sources = ["b.c"]
deps = ["a"]
"#,
    );

    keel(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency cycle detected"));
}

#[test]
fn test_manifest_type_error() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "Keel.toml",
        "[project]\nname = \"bad\"\n\n[[library]]\nname = \"a\"\noutput = \"liba.a\"\nalways-link = \"yes\"\n",
    );

    keel(tmp.path())
        .args(["--no-color", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a boolean"));
}

// ============================================================================
// keel compdb
// ============================================================================

#[test]
fn test_compdb_lists_every_compile() {
    let tmp = create_project();

    keel(tmp.path()).arg("compdb").assert().success();

    let content = fs::read_to_string(tmp.path().join("compile_commands.json")).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&content).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    for entry in entries {
        assert!(entry["command"].as_str().unwrap().contains(" -c "));
        assert!(!entry["command"].as_str().unwrap().contains("$flags"));
    }
}

// ============================================================================
// keel deps / flags / linkplan
// ============================================================================

#[test]
fn test_deps_shows_collector_order() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["deps", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. net"))
        .stdout(predicate::str::contains("2. core [always-link]"));
}

#[test]
fn test_flags_show_includes() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["flags", "net"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lib/net"))
        .stdout(predicate::str::contains("-O2"));
}

#[test]
fn test_linkplan_brackets_always_link() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["linkplan", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("From: core (whole archive)"))
        .stdout(predicate::str::contains("-Wl,--whole-archive"))
        .stdout(predicate::str::contains("-lm"));
}

#[test]
fn test_linkplan_rejects_library() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["linkplan", "core"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is a library"));
}

// ============================================================================
// keel toolchain
// ============================================================================

#[test]
fn test_toolchain_show() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["toolchain", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gcc (default)"))
        .stdout(predicate::str::contains("CFLAGS:   -O2"));
}

#[test]
fn test_selecting_other_toolchain_fails() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["--toolchain", "clang", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_selecting_default_toolchain_succeeds() {
    let tmp = create_project();

    keel(tmp.path())
        .args(["--toolchain", "gcc", "plan", "-o", "-"])
        .assert()
        .success();
}
