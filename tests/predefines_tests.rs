//! Integration tests for cross-compiler predefine probing.
//!
//! The recorded invocations pin the exact argument vector handed to the
//! compiler; the Unix-only tests run a fake compiler script end to end.

use anyhow::{Context, Result, ensure};
use rstest::rstest;
use shikumi::toolchain::{
    Dispatch, Platform, PredefineProber, ProbeError, SystemRunner, ToolchainEnv,
};
use test_support::{RecordingRunner, Reply};

const WASI_DEFINES: &str = "#define __wasm__ 1\n#define __wasi__ 1\n";

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

#[test]
fn quoted_compiler_path_with_space_is_one_token() -> Result<()> {
    let env = ToolchainEnv::with_target_cc("\"/Users/Toyo Li/wasi-sdk/bin/clang\" -O3")
        .with_cflags("--target=wasm32-wasi-threads -pthread");
    let prober =
        PredefineProber::with_runner(env, Platform::Posix, RecordingRunner::printing(WASI_DEFINES));
    let defines = prober.probe()?;
    ensure!(defines.contains_key("__wasi__"), "missing __wasi__: {defines:?}");

    let calls = prober_calls(&prober);
    let call = calls.first().context("one invocation")?;
    ensure!(
        call.argv
            == argv(&[
                "/Users/Toyo Li/wasi-sdk/bin/clang",
                "-O3",
                "--target=wasm32-wasi-threads",
                "-pthread",
                "-dM",
                "-E",
                "-x",
                "c",
                "/dev/null",
            ]),
        "unexpected argv {:?}",
        call.argv
    );
    ensure!(call.dispatch == Dispatch::Direct);
    Ok(())
}

#[test]
fn windows_paths_are_normalised_and_dispatched_through_the_shell() -> Result<()> {
    let env = ToolchainEnv::with_target_cc("\"C:\\Program Files\\wasi-sdk\\clang.exe\"");
    let prober = PredefineProber::with_runner(
        env,
        Platform::Windows,
        RecordingRunner::printing(WASI_DEFINES),
    );
    prober.probe()?;

    let calls = prober_calls(&prober);
    let call = calls.first().context("one invocation")?;
    let (input, head) = call.argv.split_last().context("argv has an input")?;
    ensure!(
        head == argv(&["C:/Program Files/wasi-sdk/clang.exe", "-dM", "-E", "-x", "c"]).as_slice(),
        "unexpected argv {:?}",
        call.argv
    );
    ensure!(input.ends_with(".c"), "input should be a scratch C file: {input}");
    ensure!(call.dispatch == Dispatch::Shell);
    Ok(())
}

#[test]
fn unquoted_compiler_and_flag_split_on_whitespace() -> Result<()> {
    let env = ToolchainEnv::with_target_cc("/opt/wasi-sdk/bin/clang --target=wasm32");
    let prober =
        PredefineProber::with_runner(env, Platform::Posix, RecordingRunner::printing(WASI_DEFINES));
    prober.probe()?;
    let calls = prober_calls(&prober);
    let call = calls.first().context("one invocation")?;
    ensure!(
        call.argv.get(..2)
            == Some(&argv(&["/opt/wasi-sdk/bin/clang", "--target=wasm32"])[..]),
        "unexpected argv {:?}",
        call.argv
    );
    Ok(())
}

#[test]
fn no_compiler_means_no_process() -> Result<()> {
    let prober = PredefineProber::with_runner(
        ToolchainEnv::default(),
        Platform::Posix,
        RecordingRunner::printing(WASI_DEFINES),
    );
    ensure!(prober.probe()?.is_empty());
    ensure!(prober_calls(&prober).is_empty(), "nothing should be spawned");
    Ok(())
}

#[rstest]
#[case(Reply::Exit(1, "clang: error: unknown target".to_owned()))]
#[case(Reply::LaunchError(std::io::ErrorKind::NotFound))]
#[case(Reply::LaunchError(std::io::ErrorKind::PermissionDenied))]
fn probe_failures_degrade_to_empty(#[case] reply: Reply) -> Result<()> {
    let prober = PredefineProber::with_runner(
        ToolchainEnv::with_target_cc("clang"),
        Platform::Posix,
        RecordingRunner::new(reply),
    );
    ensure!(prober.probe()?.is_empty());
    Ok(())
}

#[test]
fn unbalanced_compiler_quotes_are_fatal() {
    let prober = PredefineProber::with_runner(
        ToolchainEnv::with_target_cc("\"/opt/my clang"),
        Platform::Posix,
        RecordingRunner::printing(WASI_DEFINES),
    );
    let err = prober.probe().expect_err("unbalanced quotes");
    assert!(matches!(
        err,
        ProbeError::MalformedCommand {
            variable: "CC_target",
            ..
        }
    ));
}

#[test]
fn each_probe_runs_the_compiler_again() -> Result<()> {
    let prober = PredefineProber::with_runner(
        ToolchainEnv::with_target_cc("clang"),
        Platform::Posix,
        RecordingRunner::printing(WASI_DEFINES),
    );
    prober.probe()?;
    prober.probe()?;
    ensure!(prober_calls(&prober).len() == 2, "results must not be cached");
    Ok(())
}

fn prober_calls(
    prober: &PredefineProber<RecordingRunner>,
) -> Vec<shikumi::toolchain::Invocation> {
    prober.runner().calls()
}

#[cfg(unix)]
#[test]
fn real_spawn_parses_fake_compiler_output() -> Result<()> {
    let compiler = test_support::fake_compiler("#define __EMSCRIPTEN__ 1\n#define __SIZEOF_INT__ 4")?;
    let env = ToolchainEnv::with_target_cc(compiler.path.as_str()).with_cflags("-sSTRICT=1");
    let prober = PredefineProber::with_runner(env, Platform::Posix, SystemRunner::new(Platform::Posix));
    let defines = prober.probe()?;
    ensure!(
        defines.get("__SIZEOF_INT__").map(String::as_str) == Some("4"),
        "unexpected defines {defines:?}"
    );
    let args = compiler.recorded_args()?;
    ensure!(
        args == argv(&["-sSTRICT=1", "-dM", "-E", "-x", "c", "/dev/null"]),
        "unexpected args {args:?}"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn real_spawn_failure_degrades() -> Result<()> {
    let tool = test_support::fake_failing_tool(3, "boom")?;
    let prober = PredefineProber::with_runner(
        ToolchainEnv::with_target_cc(tool.path.as_str()),
        Platform::Posix,
        SystemRunner::new(Platform::Posix),
    );
    ensure!(prober.probe()?.is_empty());
    ensure!(!tool.recorded_args()?.is_empty(), "the tool should have run");
    Ok(())
}
