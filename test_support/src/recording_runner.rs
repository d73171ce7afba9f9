//! A [`ProcessRunner`] double that records invocations.

use std::io;
use std::sync::{Mutex, PoisonError};

use shikumi::toolchain::{Invocation, ProcessOutput, ProcessRunner};

/// Canned result replayed for every invocation.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit successfully, printing this text.
    Stdout(String),
    /// Exit with this status and stderr.
    Exit(i32, String),
    /// Fail to launch with this error kind.
    LaunchError(io::ErrorKind),
}

/// Records each [`Invocation`] and answers with a fixed [`Reply`].
#[derive(Debug)]
pub struct RecordingRunner {
    reply: Reply,
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    /// Runner answering every call with `reply`.
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Runner that prints `stdout` and succeeds.
    pub fn printing(stdout: &str) -> Self {
        Self::new(Reply::Stdout(stdout.to_owned()))
    }

    /// Invocations seen so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
        match &self.reply {
            Reply::Stdout(text) => Ok(ProcessOutput::succeeded(text.as_bytes())),
            Reply::Exit(code, stderr) => Ok(ProcessOutput {
                status: Some(*code),
                success: *code == 0,
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            }),
            Reply::LaunchError(kind) => Err(io::Error::from(*kind)),
        }
    }
}
