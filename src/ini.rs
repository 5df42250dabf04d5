// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Vale configuration file handling.
//!
//! Vale reads its settings from a `.vale.ini` file. Stilyagi only needs a
//! small, line-oriented subset of the INI format to manage that file: root
//! options, `[section]` headers, and `key = value` pairs. Everything else is
//! dropped when the file gets rewritten.
//!
//! # Rendering Rules
//!
//! Rendering is deterministic. Root options come first, with the keys listed
//! in [`ROOT_PRIORITY`] leading, followed by every other root option in the
//! order it was parsed. Sections follow, with the names listed in
//! [`SECTION_ORDER`] leading, followed by every other section sorted by name.
//! Each group is separated by exactly one blank line, and the file always ends
//! with a single newline.
//!
//! # Leniency
//!
//! Lines that are neither section headers nor `key = value` pairs are silently
//! ignored instead of rejected. Hand-edited configuration files tend to carry
//! comments in all sorts of shapes, and refusing to touch them would be far
//! more annoying than losing a stray line.

use crate::config::InstallManifest;

use indexmap::IndexMap;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_to_string, write},
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info, instrument};

/// Ordered listing of key/value options.
pub type Options = IndexMap<String, String>;

/// Root options that always lead the rendered file.
pub const ROOT_PRIORITY: [&str; 3] = ["Packages", "MinAlertLevel", "Vocab"];

/// Sections that always lead the rendered file.
pub const SECTION_ORDER: [&str; 4] = [
    "docs/**/*.{md,markdown,mdx}",
    "AGENTS.md",
    "*.{rs,ts,js,sh,py}",
    "README.md",
];

/// Block ignore pattern that keeps Vale out of Markdown footnotes.
pub const FOOTNOTE_REGEX: &str = r"(?m)^\[\^\d+\]:[^\n]*(?:\n[ \t]+[^\n]*)*";

const BLOCK_IGNORES: &str = "BlockIgnores";

/// Parsed `.vale.ini` document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValeIni {
    /// Options that appear before any section header.
    pub root: Options,

    /// Sections keyed by their glob pattern or file name.
    pub sections: IndexMap<String, Options>,
}

impl ValeIni {
    /// Construct new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load document from file.
    ///
    /// A missing file yields an empty document.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadIni`] if the file exists but cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match read_to_string(path.as_ref()) {
            Ok(content) => Ok(content.parse()?),
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                debug!("no configuration at {}, starting empty", path.as_ref().display());
                Ok(Self::new())
            }
            Err(err) => Err(Error::ReadIni {
                source: err,
                ini_path: path.as_ref().to_path_buf(),
            }),
        }
    }

    /// Write rendered document to file in one shot.
    ///
    /// # Errors
    ///
    /// - Return [`Error::WriteIni`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write(path.as_ref(), self.to_string()).map_err(|err| Error::WriteIni {
            source: err,
            ini_path: path.as_ref().to_path_buf(),
        })
    }

    /// Overlay required section onto section of the same name.
    pub fn merge_section(&mut self, name: impl Into<String>, required: &Options) {
        let name = name.into();
        let merged = match self.sections.get(&name) {
            Some(existing) => merge_required(existing, required),
            None => merge_required(&Options::new(), required),
        };
        self.sections.insert(name, merged);
    }

    /// Apply every option and section an installed style pack demands.
    ///
    /// Root options `Packages`, `MinAlertLevel`, and `Vocab` are overwritten,
    /// and each required section is merged with whatever the document already
    /// holds under that name. Unrelated root options and sections are left
    /// alone.
    pub fn apply_install(&mut self, packages_url: impl Into<String>, manifest: &InstallManifest) {
        let vocab = if manifest.vocab_name.is_empty() {
            manifest.style_name.clone()
        } else {
            manifest.vocab_name.clone()
        };
        self.root.insert("Packages".into(), packages_url.into());
        self.root
            .insert("MinAlertLevel".into(), manifest.min_alert_level.clone());
        self.root.insert("Vocab".into(), vocab);

        for (name, required) in required_sections(&manifest.style_name) {
            self.merge_section(name, &required);
        }
    }
}

impl FromStr for ValeIni {
    type Err = Error;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut ini = ValeIni::new();
        let mut current: Option<String> = None;

        for line in data.lines() {
            let stripped = line.trim();
            if stripped.is_empty() || stripped.starts_with('#') || stripped.starts_with(';') {
                continue;
            }

            if stripped.starts_with('[') && stripped.ends_with(']') && stripped.len() >= 2 {
                let name = stripped[1..stripped.len() - 1].trim().to_string();
                ini.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let options = match &current {
                Some(name) => ini.sections.entry(name.clone()).or_default(),
                None => &mut ini.root,
            };
            options.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(ini)
    }
}

impl Display for ValeIni {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let mut lines: Vec<String> = Vec::new();

        for key in ROOT_PRIORITY {
            if let Some(value) = self.root.get(key) {
                lines.push(format!("{key} = {value}"));
            }
        }
        for (key, value) in &self.root {
            if !ROOT_PRIORITY.contains(&key.as_str()) {
                lines.push(format!("{key} = {value}"));
            }
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }

        for name in SECTION_ORDER {
            if let Some(options) = self.sections.get(name) {
                emit_section(name, options, &mut lines);
            }
        }

        let mut remaining = self
            .sections
            .keys()
            .filter(|name| !SECTION_ORDER.contains(&name.as_str()))
            .collect::<Vec<_>>();
        remaining.sort();
        for name in remaining {
            emit_section(name, &self.sections[name], &mut lines);
        }

        writeln!(fmt, "{}", lines.join("\n").trim_end())
    }
}

fn emit_section(name: &str, options: &Options, lines: &mut Vec<String>) {
    lines.push(format!("[{name}]"));
    for (key, value) in options {
        if key == BLOCK_IGNORES {
            lines.push("# Ignore for footnotes".into());
        }
        lines.push(format!("{key} = {value}"));
    }
    lines.push(String::new());
}

/// Merge required options over existing options.
///
/// Required keys win on conflict and lead the result in their own order.
/// Remaining existing keys follow in their original order.
pub fn merge_required(existing: &Options, required: &Options) -> Options {
    let mut merged = required.clone();
    for (key, value) in existing {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}

/// Catalogue of sections every installation enforces for a given style.
pub fn required_sections(style_name: &str) -> IndexMap<String, Options> {
    let rust_no_run = format!("{style_name}.RustNoRun");
    let acronyms = format!("{style_name}.Acronyms");
    let pronouns = format!("{style_name}.Pronouns");
    let options = |pairs: &[(&str, &str)]| -> Options {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    };

    IndexMap::from([
        (
            SECTION_ORDER[0].to_string(),
            options(&[("BasedOnStyles", style_name), (BLOCK_IGNORES, FOOTNOTE_REGEX)]),
        ),
        (
            SECTION_ORDER[1].to_string(),
            options(&[("BasedOnStyles", style_name)]),
        ),
        (
            SECTION_ORDER[2].to_string(),
            options(&[
                ("BasedOnStyles", style_name),
                (rust_no_run.as_str(), "NO"),
                (acronyms.as_str(), "NO"),
            ]),
        ),
        (
            SECTION_ORDER[3].to_string(),
            options(&[
                ("BasedOnStyles", style_name),
                (pronouns.as_str(), "NO"),
            ]),
        ),
    ])
}

/// Update `.vale.ini` so it advertises an installed style pack.
///
/// Running this twice with the same inputs leaves the file byte-identical
/// after the second run.
///
/// # Errors
///
/// - Return [`Error::ReadIni`] if an existing file cannot be read.
/// - Return [`Error::WriteIni`] if the file cannot be written.
#[instrument(skip(path, packages_url, manifest), level = "debug")]
pub fn update_vale_ini(
    path: impl AsRef<Path>,
    packages_url: &str,
    manifest: &InstallManifest,
) -> Result<()> {
    let mut ini = ValeIni::load(path.as_ref())?;
    ini.apply_install(packages_url, manifest);
    ini.save(path.as_ref())?;
    info!("updated {}", path.as_ref().display());

    Ok(())
}

/// Vale configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file cannot be read from.
    #[error("failed to read configuration at {:?}", ini_path.display())]
    ReadIni {
        #[source]
        source: std::io::Error,
        ini_path: PathBuf,
    },

    /// Configuration file cannot be written to.
    #[error("failed to write configuration at {:?}", ini_path.display())]
    WriteIni {
        #[source]
        source: std::io::Error,
        ini_path: PathBuf,
    },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        crate::error::ErrorKind::Io
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
