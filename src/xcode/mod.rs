//! Xcode build-setting emulation.
//!
//! [`XcodeSettings`] reads a target's per-configuration `xcode_settings` and
//! reproduces the compiler and linker switches Xcode would pass, including
//! the defaults Xcode applies when a setting is absent. Flag order matters and
//! multi-token flags such as `-arch arm64` stay separate elements.
//!
//! ```
//! use shikumi::spec::{Configuration, TargetSpec, TargetType};
//! use shikumi::xcode::XcodeSettings;
//!
//! let spec = TargetSpec::new("wee", TargetType::StaticLibrary)
//!     .with_configuration("Release", Configuration::default());
//! let settings = XcodeSettings::new(&spec);
//! let cflags = settings.get_cflags("Release", Some("arm64"))?;
//! assert_eq!(
//!     cflags,
//!     ["-fasm-blocks", "-mpascal-strings", "-Os", "-gdwarf-2", "-arch", "arm64"]
//! );
//! # Ok::<(), shikumi::xcode::SettingsError>(())
//! ```

mod cflags;
mod ldflags;

use std::borrow::Cow;

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;
use tracing::warn;

use crate::spec::{Configuration, SettingValue, Settings, TargetSpec, TargetType};

/// Architectures `$(ARCHS_STANDARD)` expands to.
const ARCHS_STANDARD: [&str; 2] = ["arm64", "x86_64"];

/// Base directory for install names when `DYLIB_INSTALL_NAME_BASE` is unset.
const DEFAULT_INSTALL_NAME_BASE: &str = "/usr/local/lib";

/// Install name used when `LD_DYLIB_INSTALL_NAME` is unset.
const DEFAULT_INSTALL_NAME: &str =
    "$(DYLIB_INSTALL_NAME_BASE:standardizepath)/$(EXECUTABLE_PATH)";

/// Errors raised while emulating Xcode settings.
#[derive(Debug, Error, Diagnostic)]
pub enum SettingsError {
    /// The target has no configuration with the requested name.
    #[error("target `{target}` has no configuration named `{configuration}`")]
    #[diagnostic(
        code(shikumi::xcode::configuration_not_found),
        help("pass one of the names under the target's `configurations` key")
    )]
    ConfigurationNotFound {
        /// Target being queried.
        target: String,
        /// Requested configuration name.
        configuration: String,
    },
    /// `DEBUG_INFORMATION_FORMAT` names a format without a compiler switch.
    #[error("debug information format `{format}` in configuration `{configuration}` is not supported")]
    #[diagnostic(
        code(shikumi::xcode::unsupported_debug_format),
        help("use `dwarf` or `dwarf-with-dsym`")
    )]
    UnsupportedDebugFormat {
        /// Configuration holding the setting.
        configuration: String,
        /// The rejected format.
        format: String,
    },
}

/// Xcode settings view over one target.
#[derive(Clone, Copy, Debug)]
pub struct XcodeSettings<'a> {
    spec: &'a TargetSpec,
    cross_compiling: bool,
}

/// Settings of one configuration with Xcode's lookup conventions.
#[derive(Clone, Copy)]
struct ConfigView<'a> {
    name: &'a str,
    config: &'a Configuration,
}

impl<'a> ConfigView<'a> {
    const fn settings(&self) -> &'a Settings {
        &self.config.xcode_settings
    }

    /// Setting under `key`, ignoring values no reader understands.
    fn get(&self, key: &str) -> Option<&'a SettingValue> {
        self.settings()
            .get(key)
            .filter(|value| !value.is_unrecognised())
    }

    fn text(&self, key: &str) -> Option<Cow<'a, str>> {
        self.get(key).and_then(SettingValue::as_text)
    }

    fn text_or(&self, key: &str, default: &'static str) -> Cow<'a, str> {
        self.text(key).unwrap_or(Cow::Borrowed(default))
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(SettingValue::as_list).unwrap_or_default()
    }

    fn is_yes(&self, key: &str, default: bool) -> bool {
        self.text(key)
            .map_or(default, |value| value.as_ref() == "YES")
    }

    fn push_if_yes(&self, flags: &mut Vec<String>, key: &str, default: bool, flag: &str) {
        if self.is_yes(key, default) {
            flags.push(flag.to_owned());
        }
    }

    /// `SDKROOT` when it names an SDK directory rather than an SDK alias.
    fn sdk_root(&self) -> Option<Cow<'a, str>> {
        self.text("SDKROOT").filter(|root| root.starts_with('/'))
    }

    fn push_sysroot(&self, flags: &mut Vec<String>) {
        if let Some(root) = self.sdk_root() {
            flags.push("-isysroot".to_owned());
            flags.push(root.into_owned());
        }
    }

    fn push_deployment_target(&self, flags: &mut Vec<String>) {
        if let Some(version) = self.text("MACOSX_DEPLOYMENT_TARGET") {
            flags.push(format!("-mmacosx-version-min={version}"));
        }
        if let Some(version) = self.text("IPHONEOS_DEPLOYMENT_TARGET") {
            let simulator = self
                .text("SDKROOT")
                .is_some_and(|root| root.contains("simulator"));
            if simulator {
                flags.push(format!("-mios-simulator-version-min={version}"));
            } else {
                flags.push(format!("-miphoneos-version-min={version}"));
            }
        }
    }

    fn push_framework_dirs(&self, flags: &mut Vec<String>) {
        let root = self.text("SDKROOT").unwrap_or_default();
        flags.extend(
            self.config
                .mac_framework_dirs
                .iter()
                .map(|dir| format!("-F{}", dir.replace("$(SDKROOT)", &root))),
        );
    }

    fn active_archs(&self) -> Vec<String> {
        let requested = self
            .get("ARCHS")
            .map_or_else(|| vec!["$(ARCHS_STANDARD)".to_owned()], SettingValue::as_list);
        let mut archs: Vec<String> = Vec::new();
        for arch in requested {
            if matches!(arch.as_str(), "$(ARCHS_STANDARD)" | "$(ARCHS_STANDARD_64_BIT)") {
                archs.extend(ARCHS_STANDARD.map(str::to_owned));
            } else {
                archs.push(arch);
            }
        }
        if let Some(setting) = self.get("VALID_ARCHS") {
            let valid = setting.as_list();
            archs.retain(|arch| valid.contains(arch));
        }
        archs.into_iter().unique().collect()
    }
}

impl<'a> XcodeSettings<'a> {
    /// Settings view over `spec`.
    #[must_use]
    pub const fn new(spec: &'a TargetSpec) -> Self {
        Self {
            spec,
            cross_compiling: false,
        }
    }

    /// Suppress `-arch` flags, which a cross toolchain selects itself.
    #[must_use]
    pub const fn with_cross_compile(mut self, cross_compiling: bool) -> Self {
        self.cross_compiling = cross_compiling;
        self
    }

    /// The target this view reads.
    #[must_use]
    pub const fn spec(&self) -> &'a TargetSpec {
        self.spec
    }

    fn view(&self, configuration: &str) -> Result<ConfigView<'a>, SettingsError> {
        self.spec
            .configurations
            .get_key_value(configuration)
            .map(|(name, config)| ConfigView { name, config })
            .ok_or_else(|| SettingsError::ConfigurationNotFound {
                target: self.spec.target_name.clone(),
                configuration: configuration.to_owned(),
            })
    }

    /// First value of a setting that should agree across configurations.
    fn per_target_setting(&self, key: &str) -> Option<Cow<'a, str>> {
        self.spec
            .configurations
            .values()
            .find_map(|config| config.xcode_settings.get(key).and_then(SettingValue::as_text))
    }

    /// Architectures built for `configuration`.
    ///
    /// `ARCHS` defaults to `$(ARCHS_STANDARD)`, which expands to
    /// `arm64 x86_64`; the result is filtered by `VALID_ARCHS` when set.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn active_archs(&self, configuration: &str) -> Result<Vec<String>, SettingsError> {
        Ok(self.view(configuration)?.active_archs())
    }

    fn arch_for(&self, view: &ConfigView<'a>, arch: Option<&str>) -> Option<String> {
        if let Some(explicit) = arch {
            return Some(explicit.to_owned());
        }
        let archs = view.active_archs();
        if archs.len() > 1 {
            warn!(
                target = %self.spec.target_name,
                configuration = view.name,
                ?archs,
                "several active architectures; using the first",
            );
        }
        let first = archs.into_iter().next();
        if first.is_none() {
            warn!(
                target = %self.spec.target_name,
                configuration = view.name,
                "no active architecture; omitting -arch",
            );
        }
        first
    }

    /// File name of the linked product, or `None` for types Xcode does not
    /// link.
    ///
    /// Honours `EXECUTABLE_PREFIX` and `EXECUTABLE_EXTENSION`, then the
    /// target's `product_prefix` and `product_extension`.
    #[must_use]
    pub fn executable_name(&self) -> Option<String> {
        let (default_prefix, default_extension) = match self.spec.target_type {
            TargetType::Executable => ("", ""),
            TargetType::StaticLibrary => ("lib", "a"),
            TargetType::SharedLibrary => ("lib", "dylib"),
            TargetType::LoadableModule => ("", "so"),
            TargetType::None | TargetType::Other(_) => return None,
        };
        let prefix = self
            .per_target_setting("EXECUTABLE_PREFIX")
            .map(Cow::into_owned)
            .or_else(|| self.spec.product_prefix.clone())
            .unwrap_or_else(|| default_prefix.to_owned());
        let extension = self
            .per_target_setting("EXECUTABLE_EXTENSION")
            .map(Cow::into_owned)
            .or_else(|| self.spec.product_extension.clone())
            .unwrap_or_else(|| default_extension.to_owned());
        let name = self.spec.product_name.as_deref().unwrap_or_else(|| {
            if prefix == "lib" {
                self.spec
                    .target_name
                    .strip_prefix("lib")
                    .unwrap_or(&self.spec.target_name)
            } else {
                &self.spec.target_name
            }
        });
        if extension.is_empty() {
            Some(format!("{prefix}{name}"))
        } else {
            Some(format!("{prefix}{name}.{extension}"))
        }
    }

    /// `-install_name` operand for shared libraries, `None` otherwise.
    ///
    /// `LD_DYLIB_INSTALL_NAME` defaults to
    /// `$(DYLIB_INSTALL_NAME_BASE:standardizepath)/$(EXECUTABLE_PATH)` with a
    /// base of `/usr/local/lib`. Spaces are escaped with backslashes.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ConfigurationNotFound`] for unknown names.
    pub fn install_name(&self, configuration: &str) -> Result<Option<String>, SettingsError> {
        let view = self.view(configuration)?;
        if self.spec.target_type != TargetType::SharedLibrary {
            return Ok(None);
        }
        let Some(executable) = self.executable_name() else {
            return Ok(None);
        };
        let base = view.text_or("DYLIB_INSTALL_NAME_BASE", DEFAULT_INSTALL_NAME_BASE);
        let standardized = standardize_path(&base);
        let template = view.text_or("LD_DYLIB_INSTALL_NAME", DEFAULT_INSTALL_NAME);
        let name = template
            .replace("$(DYLIB_INSTALL_NAME_BASE:standardizepath)", standardized)
            .replace("$(DYLIB_INSTALL_NAME_BASE)", &base)
            .replace("$(EXECUTABLE_PATH)", &executable)
            .replace("$(EXECUTABLE_NAME)", &executable);
        Ok(Some(name.replace(' ', "\\ ")))
    }
}

/// Drop trailing separators except for the root itself.
fn standardize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}
