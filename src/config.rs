// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manifest layout.
//!
//! Specify the layout of the `stilyagi.toml` manifest that style packs may
//! bundle to describe how they want to be installed. File I/O is left to the
//! caller to figure out.

use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};
use toml::Value;

/// Name of the manifest file inside a packaged archive.
pub const MANIFEST_FILE_NAME: &str = "stilyagi.toml";

/// Alert level used when nothing else is specified.
pub const DEFAULT_MIN_ALERT_LEVEL: &str = "warning";

/// Raw manifest layout.
///
/// All settings are grouped under a single `[install]` table. Every field is
/// optional, because a pack author may only care to override one of them.
/// Settings are checked one by one, so a mistyped field only loses itself and
/// an `install` key that is not a table is treated as absent.
///
/// # General Layout
///
/// ```toml
/// [install]
/// style_name = "concordat"
/// vocab = "concordat"
/// min_alert_level = "warning"
/// ```
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
pub struct Manifest {
    /// Installation settings.
    #[serde(default, deserialize_with = "lenient_settings")]
    pub install: Option<InstallSettings>,
}

impl Manifest {
    /// Resolve settings into concrete install values.
    ///
    /// Blank or missing settings fall back to the given style name, the
    /// resolved style name for the vocabulary, and "warning" for the minimum
    /// alert level.
    pub fn resolve(&self, default_style_name: &str) -> InstallManifest {
        let settings = self.install.clone().unwrap_or_default();
        let style_name = pick(settings.style_name.as_ref(), default_style_name);
        let vocab_name = pick(settings.vocab.as_ref(), &style_name);
        let min_alert_level = pick(settings.min_alert_level.as_ref(), DEFAULT_MIN_ALERT_LEVEL);

        InstallManifest {
            style_name,
            vocab_name,
            min_alert_level,
        }
    }
}

impl FromStr for Manifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for Manifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Settings of the `[install]` table.
///
/// Values stay untyped until [`Manifest::resolve`], where anything that is
/// not a string falls back to its default.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
pub struct InstallSettings {
    /// Name of the style to enable through `BasedOnStyles`.
    pub style_name: Option<Value>,

    /// Vocabulary to select through `Vocab`.
    pub vocab: Option<Value>,

    /// Minimum alert level to select through `MinAlertLevel`.
    pub min_alert_level: Option<Value>,
}

fn lenient_settings<'de, D>(deserializer: D) -> Result<Option<InstallSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.try_into::<InstallSettings>().ok()))
}

/// Concrete values used to install a style pack.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InstallManifest {
    pub style_name: String,
    pub vocab_name: String,
    pub min_alert_level: String,
}

impl InstallManifest {
    /// Default install values for a style name.
    pub fn for_style(style_name: impl Into<String>) -> Self {
        Manifest::default().resolve(&style_name.into())
    }
}

fn pick(value: Option<&Value>, fallback: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize manifest.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize manifest.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        crate::error::ErrorKind::MalformedInput
    }
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}
