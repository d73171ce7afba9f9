//! Cross-compiler predefined macro probing.
//!
//! A compiler reveals which platform it targets through the macros it defines
//! before reading any input. [`PredefineProber`] runs the configured compiler
//! with `-dM -E -x c` against an empty input and collects the `#define` lines
//! it prints.
//!
//! The probe is best effort: a compiler that fails to launch or exits with an
//! error yields an empty mapping, because flavor detection can always fall
//! back to the host platform. Only a compiler variable that cannot be split
//! into tokens is fatal, since a wrong split could run an unintended program.

use std::io;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use miette::Diagnostic;
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;
use tracing::{debug, warn};

use super::env::{CompilerCommand, ToolchainEnv};
use super::platform::Platform;
use super::process::{Invocation, ProcessRunner, SystemRunner};

/// Predefined macro names mapped to their values, in compiler output order.
pub type Predefines = IndexMap<String, String>;

/// Flags asking the compiler to dump macro definitions for an empty C input.
const DUMP_MACRO_FLAGS: [&str; 4] = ["-dM", "-E", "-x", "c"];

/// Errors that abort a probe.
#[derive(Debug, Error, Diagnostic)]
pub enum ProbeError {
    /// A compiler variable has unbalanced quotes.
    #[error("cannot split {variable} value `{value}`: unbalanced quotes")]
    #[diagnostic(
        code(shikumi::toolchain::malformed_command),
        help("quote paths containing spaces with matching double quotes")
    )]
    MalformedCommand {
        /// Variable holding the malformed value.
        variable: &'static str,
        /// The raw value.
        value: String,
    },
}

/// Interrogates the configured compiler for its predefined macros.
#[derive(Debug)]
pub struct PredefineProber<R = SystemRunner> {
    env: ToolchainEnv,
    platform: Platform,
    runner: R,
}

impl PredefineProber<SystemRunner> {
    /// Probe with real processes on the running host.
    #[must_use]
    pub fn new(env: ToolchainEnv) -> Self {
        let platform = Platform::host();
        Self::with_runner(env, platform, SystemRunner::new(platform))
    }
}

impl<R: ProcessRunner> PredefineProber<R> {
    /// Probe with an explicit platform and process runner.
    #[must_use]
    pub const fn with_runner(env: ToolchainEnv, platform: Platform, runner: R) -> Self {
        Self {
            env,
            platform,
            runner,
        }
    }

    /// The environment snapshot this prober reads.
    #[must_use]
    pub const fn env(&self) -> &ToolchainEnv {
        &self.env
    }

    /// The runner used to spawn the compiler.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the configured compiler and collect its predefined macros.
    ///
    /// Returns an empty mapping without spawning anything when no compiler is
    /// configured. The result is never cached; every call probes afresh.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::MalformedCommand`] when the compiler or flags
    /// variable cannot be tokenised.
    pub fn probe(&self) -> Result<Predefines, ProbeError> {
        let Some(selected) = self.env.compiler_command() else {
            debug!("no cross-compiler configured; skipping predefine probe");
            return Ok(Predefines::new());
        };
        let mut argv = self.tokenise(&selected)?;
        argv.extend(DUMP_MACRO_FLAGS.map(str::to_owned));

        let input = match ProbeInput::acquire(self.platform) {
            Ok(input) => input,
            Err(err) => {
                warn!(error = %err, "cannot create probe input; skipping predefine probe");
                return Ok(Predefines::new());
            }
        };
        argv.push(input.path().to_owned());

        let invocation = Invocation::new(argv, self.platform.dispatch());
        let outcome = self.runner.run(&invocation);
        input.release();

        match outcome {
            Ok(output) if output.success => {
                let defines = parse_predefines(&String::from_utf8_lossy(&output.stdout));
                debug!(count = defines.len(), "collected compiler predefines");
                Ok(defines)
            }
            Ok(output) => {
                warn!(
                    status = ?output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "cross-compiler probe exited unsuccessfully; ignoring predefines",
                );
                Ok(Predefines::new())
            }
            Err(err) => {
                warn!(
                    program = invocation.program().unwrap_or_default(),
                    error = %err,
                    "cross-compiler probe failed to launch; ignoring predefines",
                );
                Ok(Predefines::new())
            }
        }
    }

    fn tokenise(&self, selected: &CompilerCommand<'_>) -> Result<Vec<String>, ProbeError> {
        let mut argv = self.split(selected.variable, selected.command)?;
        if let Some(flags) = selected.flags {
            argv.extend(self.split(selected.flags_variable, flags)?);
        }
        Ok(argv)
    }

    fn split(&self, variable: &'static str, value: &str) -> Result<Vec<String>, ProbeError> {
        self.platform
            .split_command(value)
            .ok_or_else(|| ProbeError::MalformedCommand {
                variable,
                value: value.to_owned(),
            })
    }
}

/// Parse `-dM -E` output into a predefine mapping.
///
/// Lines shaped `#define NAME VALUE` map `NAME` to the trimmed `VALUE`; a bare
/// `#define NAME` maps to `"1"`. Other lines are ignored.
#[must_use]
pub fn parse_predefines(output: &str) -> Predefines {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("#define ")?.trim_start();
            let (name, value) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(name, value)| (name, value.trim()));
            if name.is_empty() {
                return None;
            }
            let normalised = if value.is_empty() { "1" } else { value };
            Some((name.to_owned(), normalised.to_owned()))
        })
        .collect()
}

/// Empty input fed to the compiler for the duration of one probe.
enum ProbeInput {
    Device(&'static str),
    Scratch {
        file: NamedTempFile,
        path: Utf8PathBuf,
    },
}

impl ProbeInput {
    fn acquire(platform: Platform) -> io::Result<Self> {
        if let Some(device) = platform.null_device() {
            return Ok(Self::Device(device));
        }
        let file = Builder::new()
            .prefix("shikumi-probe.")
            .suffix(".c")
            .tempfile()?;
        let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).map_err(|path| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("probe input path {} is not valid UTF-8", path.display()),
            )
        })?;
        debug!(%path, "created scratch probe input");
        Ok(Self::Scratch { file, path })
    }

    fn path(&self) -> &str {
        match self {
            Self::Device(device) => *device,
            Self::Scratch { path, .. } => path.as_str(),
        }
    }

    /// Remove any scratch file, logging rather than returning failures.
    fn release(self) {
        if let Self::Scratch { file, path } = self
            && let Err(err) = file.close()
        {
            warn!(%path, error = %err, "failed to remove scratch probe input");
        }
    }
}
