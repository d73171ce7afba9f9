//! End-to-end tests for the `shikumi` binary using `assert_cmd`.
//!
//! Every run clears the toolchain variables so results do not depend on the
//! compiler configured on the machine running the tests.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use shikumi_env::{
    CC_ENV, CC_HOST_ENV, CC_TARGET_ENV, CFLAGS_ENV, CROSSCOMPILE_ENV, CXX_ENV, CXX_HOST_ENV,
    CXX_TARGET_ENV, CXXFLAGS_ENV, NINJA_ENV,
};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn shikumi() -> Result<Command> {
    let mut cmd = Command::cargo_bin("shikumi").context("locate shikumi binary")?;
    for name in [
        CC_TARGET_ENV,
        CC_ENV,
        CFLAGS_ENV,
        CXX_TARGET_ENV,
        CXX_ENV,
        CXXFLAGS_ENV,
        CC_HOST_ENV,
        CXX_HOST_ENV,
        CROSSCOMPILE_ENV,
        NINJA_ENV,
    ] {
        cmd.env_remove(name);
    }
    Ok(cmd)
}

fn stdout_json(cmd: &mut Command) -> Result<Value> {
    let output = cmd.output().context("run shikumi")?;
    ensure!(
        output.status.success(),
        "shikumi failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).context("stdout is JSON")
}

#[test]
fn order_prints_sequenced_nodes() -> Result<()> {
    let order = stdout_json(shikumi()?.arg("order").arg(format!("{FIXTURES}/graph.json")))?;
    ensure!(
        order == serde_json::json!(["a", "c", "d", "b"]),
        "unexpected order {order}"
    );
    Ok(())
}

#[test]
fn cyclic_graph_fails_with_diagnostic() -> Result<()> {
    let dir = tempfile::tempdir().context("tempdir")?;
    let graph = dir.path().join("cycle.json");
    std::fs::write(&graph, r#"{"x": ["y"], "y": ["x"]}"#).context("write graph")?;
    shikumi()?
        .arg("order")
        .arg(&graph)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("cycle"));
    Ok(())
}

#[test]
fn explicit_flavor_is_echoed() -> Result<()> {
    shikumi()?
        .args(["flavor", "--flavor", "foobar"])
        .assert()
        .success()
        .stdout("foobar\n");
    Ok(())
}

#[test]
fn flavor_without_compiler_matches_host() -> Result<()> {
    let expected = if cfg!(target_os = "linux") {
        "linux\n"
    } else if cfg!(target_os = "macos") {
        "mac\n"
    } else if cfg!(windows) {
        "win\n"
    } else {
        return Ok(());
    };
    shikumi()?.arg("flavor").assert().success().stdout(expected);
    Ok(())
}

#[test]
fn predefines_without_compiler_are_empty() -> Result<()> {
    let defines = stdout_json(shikumi()?.arg("predefines"))?;
    ensure!(defines == serde_json::json!({}), "unexpected defines {defines}");
    Ok(())
}

#[cfg(unix)]
#[test]
fn predefines_come_from_the_target_compiler() -> Result<()> {
    let compiler = test_support::fake_compiler("#define __wasm__ 1\n#define __wasi__ 1")?;
    let defines = stdout_json(
        shikumi()?
            .env(CC_TARGET_ENV, compiler.path.as_str())
            .arg("predefines"),
    )?;
    ensure!(
        defines == serde_json::json!({"__wasm__": "1", "__wasi__": "1"}),
        "unexpected defines {defines}"
    );
    shikumi()?
        .env(CC_TARGET_ENV, compiler.path.as_str())
        .arg("flavor")
        .assert()
        .success()
        .stdout("wasi\n");
    Ok(())
}

#[test]
fn output_name_uses_requested_flavor() -> Result<()> {
    shikumi()?
        .args(["output-name", "--flavor", "linux"])
        .arg(format!("{FIXTURES}/wee_static.json"))
        .assert()
        .success()
        .stdout("libwee.a\n");
    shikumi()?
        .args(["output-name", "--flavor", "win"])
        .arg(format!("{FIXTURES}/wee_shared.json"))
        .assert()
        .success()
        .stdout("wee.dll\n");
    Ok(())
}

#[test]
fn flags_report_default_settings() -> Result<()> {
    let report = stdout_json(
        shikumi()?
            .arg("flags")
            .arg(format!("{FIXTURES}/wee_static.json"))
            .args(["-c", "Release", "--arch", "arm64", "--product-dir", "PRODUCT_DIR"]),
    )?;
    ensure!(
        report["cflags"]
            == serde_json::json!([
                "-fasm-blocks",
                "-mpascal-strings",
                "-Os",
                "-gdwarf-2",
                "-arch",
                "arm64"
            ]),
        "unexpected report {report}"
    );
    ensure!(
        report["ldflags"] == serde_json::json!(["-arch", "arm64", "-LPRODUCT_DIR"]),
        "unexpected report {report}"
    );
    ensure!(report["libtool_flags"] == serde_json::json!([]));
    Ok(())
}

#[test]
fn flags_omit_arch_when_cross_compiling() -> Result<()> {
    let report = stdout_json(
        shikumi()?
            .env(CROSSCOMPILE_ENV, "1")
            .arg("flags")
            .arg(format!("{FIXTURES}/wee_static.json"))
            .args(["-c", "Release"]),
    )?;
    ensure!(
        report["cflags"] == serde_json::json!(["-fasm-blocks", "-mpascal-strings", "-Os", "-gdwarf-2"]),
        "unexpected report {report}"
    );
    Ok(())
}

#[test]
fn flags_for_unknown_configuration_fail() -> Result<()> {
    shikumi()?
        .arg("flags")
        .arg(format!("{FIXTURES}/wee_static.json"))
        .args(["-c", "Profile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile"));
    Ok(())
}

#[test]
fn missing_input_file_fails() -> Result<()> {
    shikumi()?
        .args(["order", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does/not/exist.json"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn compdb_runs_configured_ninja() -> Result<()> {
    let ninja = test_support::fake_ninja_compdb()?;
    let build = tempfile::tempdir().context("build dir")?;
    let entries = stdout_json(
        shikumi()?
            .env(NINJA_ENV, ninja.path.as_str())
            .arg("compdb")
            .arg(build.path()),
    )?;
    ensure!(
        entries[0]["file"] == "my.in" && entries[0]["output"] == "my.out",
        "unexpected entries {entries}"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn compdb_accepts_sibling_build_directory() -> Result<()> {
    let ninja = test_support::fake_ninja_compdb()?;
    let root = tempfile::tempdir().context("project root")?;
    let work = root.path().join("work");
    std::fs::create_dir(&work).context("create work dir")?;
    std::fs::create_dir(root.path().join("out")).context("create out dir")?;
    let entries = stdout_json(
        shikumi()?
            .current_dir(&work)
            .env(NINJA_ENV, ninja.path.as_str())
            .args(["compdb", "../out"]),
    )?;
    let expected = work
        .canonicalize()
        .context("resolve work dir")?
        .join("..")
        .join("out");
    ensure!(
        entries[0]["directory"] == &*expected.to_string_lossy(),
        "unexpected entries {entries}"
    );
    Ok(())
}
