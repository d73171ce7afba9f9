//! Test utilities shared by the integration tests.
//!
//! Provides environment guards, fake toolchain executables and a recording
//! [`ProcessRunner`](shikumi::toolchain::ProcessRunner) double.

pub mod env_var_guard;
pub mod fake_tools;
pub mod recording_runner;

pub use env_var_guard::{EnvLock, EnvVarGuard, ToolchainEnvGuard};
pub use fake_tools::{
    FakeTool, fake_compiler, fake_failing_tool, fake_ninja_compdb, fake_ninja_printing,
};
pub use recording_runner::{RecordingRunner, Reply};
