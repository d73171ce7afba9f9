//! Blocking execution of toolchain commands.
//!
//! Probes describe the command they need as an [`Invocation`] and hand it to a
//! [`ProcessRunner`]. Production code uses [`SystemRunner`]; tests substitute a
//! runner that records invocations and replays canned output.

use std::io;
use std::process::{Command, Stdio};

use tracing::info;

use super::platform::{Dispatch, Platform};

/// A fully tokenised command and the way it should be dispatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Direct spawn or shell-interpreted call.
    pub dispatch: Dispatch,
}

impl Invocation {
    /// Describe a command.
    #[must_use]
    pub const fn new(argv: Vec<String>, dispatch: Dispatch) -> Self {
        Self { argv, dispatch }
    }

    /// The program to run, if any was given.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Captured result of a finished process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Whether the process reported success.
    pub success: bool,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// A successful run that printed `stdout`.
    #[must_use]
    pub fn succeeded(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }
}

/// Executes invocations and waits for them to finish.
pub trait ProcessRunner {
    /// Run `invocation` to completion, capturing both output streams.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the process cannot be launched.
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// Runs invocations as real child processes.
#[derive(Clone, Copy, Debug)]
pub struct SystemRunner {
    platform: Platform,
}

impl SystemRunner {
    /// Create a runner that dispatches shell calls through `platform`'s shell.
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn command_for(&self, invocation: &Invocation) -> io::Result<Command> {
        match invocation.dispatch {
            Dispatch::Direct => {
                let Some((program, args)) = invocation.argv.split_first() else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "cannot run an empty command",
                    ));
                };
                let mut cmd = Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
            Dispatch::Shell => {
                let payload = self
                    .platform
                    .shell_payload(&invocation.argv)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
                let (shell, shell_args) = self.platform.shell();
                let mut cmd = Command::new(shell);
                cmd.args(shell_args);
                push_shell_payload(&mut cmd, payload);
                Ok(cmd)
            }
        }
    }
}

/// `cmd.exe` parses its own command line, so the payload bypasses the
/// standard library's argument quoting.
#[cfg(windows)]
fn push_shell_payload(cmd: &mut Command, payload: String) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(payload);
}

#[cfg(not(windows))]
fn push_shell_payload(cmd: &mut Command, payload: String) {
    cmd.arg(payload);
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Platform::host())
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let mut cmd = self.command_for(invocation)?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        info!(
            dispatch = ?invocation.dispatch,
            "Running command: {}",
            invocation.argv.join(" ")
        );
        let output = cmd.output()?;
        Ok(ProcessOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
