//! Toolchain identity: which platform the configured compiler targets.
//!
//! [`FlavorDetector`] classifies the host and refines that guess with the
//! predefined macros reported by [`PredefineProber`].

mod env;
mod flavor;
mod platform;
mod predefines;
mod process;

pub use env::{CompilerCommand, ToolchainEnv};
pub use flavor::{
    Flavor, FlavorDetector, GeneratorParams, classify_host_platform, get_flavor, host_platform,
    refine_with_predefines,
};
pub use platform::{Dispatch, Platform, QuoteError};
pub use predefines::{PredefineProber, Predefines, ProbeError, parse_predefines};
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
