//! Explicit toolchain configuration snapshotted from the environment.
//!
//! Detection code reads a [`ToolchainEnv`] value instead of the process
//! environment so tests can describe any compiler setup without touching
//! global state. [`ToolchainEnv::from_process`] is the single boundary adapter.

use shikumi_env::{
    CC_ENV, CC_TARGET_ENV, CFLAGS_ENV, CROSSCOMPILE_SIGNALS, CXX_ENV, CXX_TARGET_ENV, CXXFLAGS_ENV,
};

/// Compiler selection and flags relevant to toolchain detection.
///
/// Empty strings are treated as unset, matching how shells commonly clear a
/// variable with `CC=`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolchainEnv {
    /// `CC_target`: C compiler for the target platform.
    pub cc_target: Option<String>,
    /// `CC`: generic C compiler.
    pub cc: Option<String>,
    /// `CFLAGS`: extra flags for the C compiler.
    pub cflags: Option<String>,
    /// `CXX_target`: C++ compiler for the target platform.
    pub cxx_target: Option<String>,
    /// `CXX`: generic C++ compiler.
    pub cxx: Option<String>,
    /// `CXXFLAGS`: extra flags for the C++ compiler.
    pub cxxflags: Option<String>,
    /// Whether any cross-compilation signal variable is set.
    pub crosscompile_requested: bool,
}

/// The compiler command chosen for probing, with the variables it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompilerCommand<'a> {
    /// Variable that supplied the compiler command.
    pub variable: &'static str,
    /// Compiler path plus optional leading flags.
    pub command: &'a str,
    /// Variable consulted for extra flags.
    pub flags_variable: &'static str,
    /// Extra flags, when set.
    pub flags: Option<&'a str>,
}

impl ToolchainEnv {
    /// Snapshot the relevant variables from the running process.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a snapshot from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(mut read_env: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut read = |name: &str| read_env(name).filter(|value| !value.is_empty());
        let crosscompile_requested = CROSSCOMPILE_SIGNALS
            .iter()
            .copied()
            .any(|name| read(name).is_some());
        Self {
            cc_target: read(CC_TARGET_ENV),
            cc: read(CC_ENV),
            cflags: read(CFLAGS_ENV),
            cxx_target: read(CXX_TARGET_ENV),
            cxx: read(CXX_ENV),
            cxxflags: read(CXXFLAGS_ENV),
            crosscompile_requested,
        }
    }

    /// Configure only a target C compiler, as a cross build typically does.
    #[must_use]
    pub fn with_target_cc(command: impl Into<String>) -> Self {
        Self {
            cc_target: Some(command.into()),
            crosscompile_requested: true,
            ..Self::default()
        }
    }

    /// Attach `CFLAGS` to the snapshot.
    #[must_use]
    pub fn with_cflags(mut self, flags: impl Into<String>) -> Self {
        self.cflags = Some(flags.into());
        self
    }

    /// Pick the compiler to probe.
    ///
    /// C compilers win over C++ ones and target-specific variables win over
    /// generic ones. Returns `None` when nothing is configured.
    #[must_use]
    pub fn compiler_command(&self) -> Option<CompilerCommand<'_>> {
        let c_compiler = self
            .cc_target
            .as_deref()
            .map(|cmd| (CC_TARGET_ENV, cmd))
            .or_else(|| self.cc.as_deref().map(|cmd| (CC_ENV, cmd)));
        if let Some((variable, command)) = c_compiler {
            return Some(CompilerCommand {
                variable,
                command,
                flags_variable: CFLAGS_ENV,
                flags: self.cflags.as_deref(),
            });
        }
        self.cxx_target
            .as_deref()
            .map(|cmd| (CXX_TARGET_ENV, cmd))
            .or_else(|| self.cxx.as_deref().map(|cmd| (CXX_ENV, cmd)))
            .map(|(variable, command)| CompilerCommand {
                variable,
                command,
                flags_variable: CXXFLAGS_ENV,
                flags: self.cxxflags.as_deref(),
            })
    }
}
