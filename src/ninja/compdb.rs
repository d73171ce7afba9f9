//! Compilation database extraction from a generated Ninja build.

use std::ffi::OsString;
use std::io;
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use shikumi_env::NINJA_ENV;
use thiserror::Error;
use tracing::info;

use super::paths::absolute_build_dir;

/// Program run when `SHIKUMI_NINJA` is unset.
pub const NINJA_PROGRAM: &str = "ninja";

/// Rules whose edges are reported in the database.
pub const COMPDB_RULES: [&str; 4] = ["cc", "cxx", "objc", "objcxx"];

/// One entry of a `compile_commands.json` database.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompileCommand {
    /// Working directory of the compilation.
    pub directory: String,
    /// Full compiler command line.
    pub command: String,
    /// Main source file.
    pub file: String,
    /// Object file produced, when Ninja reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Errors raised while querying Ninja for the compilation database.
#[derive(Debug, Error, Diagnostic)]
pub enum CompileDbError {
    /// The build directory cannot be resolved.
    #[error("cannot resolve build directory {path}")]
    #[diagnostic(code(shikumi::ninja::build_dir))]
    BuildDir {
        /// Directory as given.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Ninja could not be started.
    #[error("failed to run {program}")]
    #[diagnostic(
        code(shikumi::ninja::spawn),
        help("install ninja or point SHIKUMI_NINJA at its executable")
    )]
    Spawn {
        /// Program that failed to start.
        program: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Ninja reported an error.
    #[error("{program} -t compdb exited with {status}: {stderr}")]
    #[diagnostic(code(shikumi::ninja::compdb_failed))]
    Failed {
        /// Program that ran.
        program: Utf8PathBuf,
        /// Rendered exit status.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },
    /// Ninja printed something other than a JSON database.
    #[error("ninja printed an invalid compilation database")]
    #[diagnostic(code(shikumi::ninja::compdb_parse))]
    Parse {
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

fn resolve_ninja_program_with<F>(mut read_env: F) -> Utf8PathBuf
where
    F: FnMut(&str) -> Option<OsString>,
{
    read_env(NINJA_ENV)
        .filter(|value| !value.is_empty())
        .and_then(|value| Utf8PathBuf::from_path_buf(value.into()).ok())
        .unwrap_or_else(|| Utf8PathBuf::from(NINJA_PROGRAM))
}

/// Ninja program named by `SHIKUMI_NINJA`, else `ninja` on `PATH`.
#[must_use]
pub fn resolve_ninja_program() -> Utf8PathBuf {
    resolve_ninja_program_with(|key| std::env::var_os(key))
}

/// Query the Ninja build in `build_dir` for its compilation database.
///
/// # Errors
///
/// See [`generate_compile_db_with`].
pub fn generate_compile_db_with_ninja(
    build_dir: &Utf8Path,
) -> Result<Vec<CompileCommand>, CompileDbError> {
    generate_compile_db_with(&resolve_ninja_program(), build_dir)
}

/// Run `program -C <build_dir> -t compdb cc cxx objc objcxx` and decode its
/// output.
///
/// # Errors
///
/// Returns [`CompileDbError`] when the directory cannot be resolved, Ninja
/// cannot be started or fails, or its output is not a JSON array of entries.
pub fn generate_compile_db_with(
    program: &Utf8Path,
    build_dir: &Utf8Path,
) -> Result<Vec<CompileCommand>, CompileDbError> {
    let dir = absolute_build_dir(build_dir).map_err(|source| CompileDbError::BuildDir {
        path: build_dir.to_path_buf(),
        source,
    })?;
    let mut cmd = Command::new(program.as_std_path());
    cmd.arg("-C")
        .arg(dir.as_std_path())
        .args(["-t", "compdb"])
        .args(COMPDB_RULES)
        .stdin(Stdio::null());
    info!(
        "Running command: {program} -C {dir} -t compdb {}",
        COMPDB_RULES.join(" ")
    );
    let output = cmd.output().map_err(|source| CompileDbError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;
    if !output.status.success() {
        return Err(CompileDbError::Failed {
            program: program.to_path_buf(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    serde_json::from_slice(&output.stdout).map_err(|source| CompileDbError::Parse { source })
}
