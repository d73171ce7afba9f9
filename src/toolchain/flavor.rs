//! Target platform ("flavor") detection.
//!
//! The host operating system alone cannot tell a native Linux compiler from a
//! WebAssembly cross-compiler running on Linux. Detection therefore runs in two
//! stages: classify the host platform identifier, then let the configured
//! compiler's predefined macros override that guess.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::env::ToolchainEnv;
use super::platform::Platform;
use super::predefines::{PredefineProber, Predefines, ProbeError};
use super::process::{ProcessRunner, SystemRunner};

/// Logical target platform driving naming and flag conventions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Linux and unrecognised Unix-likes.
    Linux,
    /// FreeBSD and DragonFly BSD.
    FreeBsd,
    /// OpenBSD.
    OpenBsd,
    /// NetBSD.
    NetBsd,
    /// Solaris and illumos.
    Solaris,
    /// IBM AIX.
    Aix,
    /// IBM z/OS.
    Zos,
    /// IBM i.
    Os400,
    /// macOS.
    Mac,
    /// Windows, including Cygwin hosts.
    Win,
    /// Bare WebAssembly.
    Wasm,
    /// WebAssembly with the WASI system interface.
    Wasi,
    /// Emscripten.
    Emscripten,
    /// Any other flavor name, kept verbatim.
    Other(String),
}

impl Flavor {
    /// Canonical flavor name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::FreeBsd => "freebsd",
            Self::OpenBsd => "openbsd",
            Self::NetBsd => "netbsd",
            Self::Solaris => "solaris",
            Self::Aix => "aix",
            Self::Zos => "zos",
            Self::Os400 => "os400",
            Self::Mac => "mac",
            Self::Win => "win",
            Self::Wasm => "wasm",
            Self::Wasi => "wasi",
            Self::Emscripten => "emscripten",
            Self::Other(name) => name,
        }
    }

    /// Whether Windows naming conventions apply.
    #[must_use]
    pub const fn is_windows(&self) -> bool {
        matches!(self, Self::Win)
    }

    /// Whether Darwin naming conventions apply.
    #[must_use]
    pub const fn is_mac(&self) -> bool {
        matches!(self, Self::Mac)
    }
}

impl From<&str> for Flavor {
    fn from(name: &str) -> Self {
        match name {
            "linux" => Self::Linux,
            "freebsd" => Self::FreeBsd,
            "openbsd" => Self::OpenBsd,
            "netbsd" => Self::NetBsd,
            "solaris" => Self::Solaris,
            "aix" => Self::Aix,
            "zos" => Self::Zos,
            "os400" => Self::Os400,
            "mac" => Self::Mac,
            "win" => Self::Win,
            "wasm" => Self::Wasm,
            "wasi" => Self::Wasi,
            "emscripten" => Self::Emscripten,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Flavor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Flavor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

/// Generator parameters consulted by flavor detection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Explicit flavor; wins over every other signal and is not validated.
    pub flavor: Option<String>,
}

impl GeneratorParams {
    /// Parameters forcing `flavor`.
    #[must_use]
    pub fn with_flavor(flavor: impl Into<String>) -> Self {
        Self {
            flavor: Some(flavor.into()),
        }
    }
}

/// Classic platform identifier of the running host (`linux`, `darwin`,
/// `win32`, `sunos5`, ...).
#[must_use]
pub fn host_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" | "ios" => "darwin",
        "windows" => "win32",
        "solaris" | "illumos" => "sunos5",
        other => other,
    }
}

/// Classify a host platform identifier.
///
/// Unrecognised identifiers pass through unchanged as a best-effort flavor.
#[must_use]
pub fn classify_host_platform(platform: &str) -> Flavor {
    let starts = |prefixes: &[&str]| prefixes.iter().any(|prefix| platform.starts_with(prefix));
    if platform == "win32" || starts(&["cygwin"]) {
        Flavor::Win
    } else if starts(&["darwin"]) {
        Flavor::Mac
    } else if starts(&["sunos"]) {
        Flavor::Solaris
    } else if starts(&["freebsd", "dragonfly"]) {
        Flavor::FreeBsd
    } else if starts(&["openbsd"]) {
        Flavor::OpenBsd
    } else if starts(&["netbsd"]) {
        Flavor::NetBsd
    } else if starts(&["aix"]) {
        Flavor::Aix
    } else if starts(&["os390", "zos"]) {
        Flavor::Zos
    } else if platform == "os400" {
        Flavor::Os400
    } else if starts(&["linux"]) {
        Flavor::Linux
    } else {
        Flavor::Other(platform.to_owned())
    }
}

/// Override `fallback` with the WebAssembly flavor implied by `predefines`.
///
/// `__wasi__` wins over `__wasm__`, which wins over `__EMSCRIPTEN__`.
#[must_use]
pub fn refine_with_predefines(fallback: Flavor, predefines: &Predefines) -> Flavor {
    if predefines.contains_key("__wasi__") {
        Flavor::Wasi
    } else if predefines.contains_key("__wasm__") {
        Flavor::Wasm
    } else if predefines.contains_key("__EMSCRIPTEN__") {
        Flavor::Emscripten
    } else {
        fallback
    }
}

/// Resolves the flavor from parameters, host platform and compiler predefines.
#[derive(Debug)]
pub struct FlavorDetector<R = SystemRunner> {
    host_platform: String,
    prober: PredefineProber<R>,
}

impl FlavorDetector<SystemRunner> {
    /// Detector for the running host and process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::new(host_platform(), PredefineProber::new(ToolchainEnv::from_process()))
    }
}

impl<R: ProcessRunner> FlavorDetector<R> {
    /// Detector for an explicit host identifier and prober.
    #[must_use]
    pub fn new(host_platform: impl Into<String>, prober: PredefineProber<R>) -> Self {
        Self {
            host_platform: host_platform.into(),
            prober,
        }
    }

    /// Detector with an explicit environment, platform and runner.
    #[must_use]
    pub fn with_runner(
        host_platform: impl Into<String>,
        env: ToolchainEnv,
        platform: Platform,
        runner: R,
    ) -> Self {
        Self::new(
            host_platform,
            PredefineProber::with_runner(env, platform, runner),
        )
    }

    /// Determine the flavor.
    ///
    /// # Errors
    ///
    /// Propagates [`ProbeError`] when the configured compiler command cannot
    /// be tokenised. Probe process failures fall back to the host flavor.
    pub fn detect(&self, params: &GeneratorParams) -> Result<Flavor, ProbeError> {
        if let Some(flavor) = &params.flavor {
            debug!(%flavor, "using explicit flavor override");
            return Ok(Flavor::from(flavor.as_str()));
        }
        let by_host = classify_host_platform(&self.host_platform);
        let predefines = self.prober.probe()?;
        let flavor = refine_with_predefines(by_host, &predefines);
        debug!(host = %self.host_platform, %flavor, "resolved flavor");
        Ok(flavor)
    }
}

/// Determine the flavor for the running process.
///
/// # Errors
///
/// See [`FlavorDetector::detect`].
pub fn get_flavor(params: &GeneratorParams) -> Result<Flavor, ProbeError> {
    FlavorDetector::from_process().detect(params)
}
