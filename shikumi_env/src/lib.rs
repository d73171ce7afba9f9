#![forbid(unsafe_code)]

//! Environment variable names shared across shikumi crates (library, tests,
//! and helpers).
//!
//! The library never reads these ambiently inside its core; the boundary
//! adapters snapshot them into explicit configuration structs.

/// Environment variable override for the Ninja executable.
///
/// # Examples
///
/// ```
/// use shikumi_env::NINJA_ENV;
/// assert_eq!(NINJA_ENV, "SHIKUMI_NINJA");
/// ```
pub const NINJA_ENV: &str = "SHIKUMI_NINJA";

/// Requests cross-compilation explicitly, suppressing host architecture flags.
pub const CROSSCOMPILE_ENV: &str = "SHIKUMI_CROSSCOMPILE";

/// C compiler for the target platform.
pub const CC_TARGET_ENV: &str = "CC_target";

/// Generic C compiler, consulted when no target compiler is set.
pub const CC_ENV: &str = "CC";

/// Extra C compiler flags appended to the probed command.
pub const CFLAGS_ENV: &str = "CFLAGS";

/// C++ compiler for the target platform.
pub const CXX_TARGET_ENV: &str = "CXX_target";

/// Generic C++ compiler, consulted when no C compiler is set.
pub const CXX_ENV: &str = "CXX";

/// Extra C++ compiler flags appended to the probed command.
pub const CXXFLAGS_ENV: &str = "CXXFLAGS";

/// C compiler for the host platform.
pub const CC_HOST_ENV: &str = "CC_host";

/// C++ compiler for the host platform.
pub const CXX_HOST_ENV: &str = "CXX_host";

/// Variables whose presence signals a cross-compiling build.
pub const CROSSCOMPILE_SIGNALS: &[&str] = &[
    CROSSCOMPILE_ENV,
    CC_HOST_ENV,
    CXX_HOST_ENV,
    CC_TARGET_ENV,
    CXX_TARGET_ENV,
];
