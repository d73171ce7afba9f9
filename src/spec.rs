//! Already-parsed target descriptions.
//!
//! Targets arrive as structured data (JSON on the command line). Only the
//! fields the ordering, flag and naming helpers consult are typed; everything
//! else is preserved in [`Configuration::extra`] and ignored.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Kind of product a target builds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// A linked program.
    Executable,
    /// A dynamically linked library.
    SharedLibrary,
    /// An archive of object files.
    StaticLibrary,
    /// A plugin loaded at runtime.
    LoadableModule,
    /// A target with no linked output.
    None,
    /// Any other type name, kept verbatim.
    Other(String),
}

impl TargetType {
    /// Type name as written in target descriptions.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Executable => "executable",
            Self::SharedLibrary => "shared_library",
            Self::StaticLibrary => "static_library",
            Self::LoadableModule => "loadable_module",
            Self::None => "none",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for TargetType {
    fn from(name: &str) -> Self {
        match name {
            "executable" => Self::Executable,
            "shared_library" => Self::SharedLibrary,
            "static_library" => Self::StaticLibrary,
            "loadable_module" => Self::LoadableModule,
            "none" => Self::None,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TargetType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TargetType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

/// Value of a single toolchain setting.
///
/// Anything that is not a scalar or a list, such as a nested mapping or
/// `null`, is kept as [`SettingValue::Other`] and reads as unset.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// A switch; `true` reads as `YES`.
    Bool(bool),
    /// A numeric value such as an optimisation level.
    Number(serde_json::Number),
    /// A scalar string.
    Text(String),
    /// A list of tokens; items without a scalar reading are skipped.
    List(Vec<SettingValue>),
    /// A value no setting interprets.
    Other(serde_json::Value),
}

impl SettingValue {
    /// Scalar reading of the value, or `None` for [`SettingValue::Other`].
    ///
    /// Booleans read as `YES`/`NO`, numbers are stringified and lists are
    /// joined with spaces.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Bool(true) => Some(Cow::Borrowed("YES")),
            Self::Bool(false) => Some(Cow::Borrowed("NO")),
            Self::Number(number) => Some(Cow::Owned(number.to_string())),
            Self::Text(text) => Some(Cow::Borrowed(text)),
            Self::List(items) => Some(Cow::Owned(
                items.iter().filter_map(Self::as_text).join(" "),
            )),
            Self::Other(_) => None,
        }
    }

    /// List reading of the value.
    ///
    /// Scalar strings are split shell-style; a string with unbalanced quotes
    /// falls back to whitespace splitting.
    #[must_use]
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .iter()
                .filter_map(Self::as_text)
                .map(Cow::into_owned)
                .collect(),
            Self::Text(text) => shlex::split(text)
                .unwrap_or_else(|| text.split_whitespace().map(str::to_owned).collect()),
            Self::Bool(_) | Self::Number(_) => self
                .as_text()
                .map(Cow::into_owned)
                .into_iter()
                .collect(),
            Self::Other(_) => Vec::new(),
        }
    }

    /// Whether the value carries no setting a reader understands.
    #[must_use]
    pub const fn is_unrecognised(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl From<&str> for SettingValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Ordered setting name to value mapping.
pub type Settings = IndexMap<String, SettingValue>;

/// One named build configuration of a target.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Configuration {
    /// Xcode build settings.
    #[serde(default)]
    pub xcode_settings: Settings,
    /// Framework search directories; `$(SDKROOT)` is substituted.
    #[serde(default)]
    pub mac_framework_dirs: Vec<String>,
    /// Keys the helpers do not interpret.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Configuration {
    /// Configuration with the given Xcode settings.
    #[must_use]
    pub fn with_xcode_settings<I, K, V>(settings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SettingValue>,
    {
        Self {
            xcode_settings: settings
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            ..Self::default()
        }
    }
}

/// A single build target.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TargetSpec {
    /// Target name, unique within its build file.
    pub target_name: String,
    /// Product kind.
    #[serde(rename = "type")]
    pub target_type: TargetType,
    /// Overrides the product's base name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Overrides the platform's default file name prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_prefix: Option<String>,
    /// Overrides the platform's default extension, without the dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_extension: Option<String>,
    /// Named configurations in declaration order.
    #[serde(default)]
    pub configurations: IndexMap<String, Configuration>,
}

impl TargetSpec {
    /// A target with no overrides and no configurations.
    #[must_use]
    pub fn new(target_name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            target_name: target_name.into(),
            target_type,
            product_name: None,
            product_prefix: None,
            product_extension: None,
            configurations: IndexMap::new(),
        }
    }

    /// Add or replace a configuration.
    #[must_use]
    pub fn with_configuration(mut self, name: impl Into<String>, config: Configuration) -> Self {
        self.configurations.insert(name.into(), config);
        self
    }
}
