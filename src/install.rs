// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Style pack installation.
//!
//! Installing a style pack wires a published release into a consumer
//! repository by rewriting two files:
//!
//! 1. The `.vale.ini` is pointed at the release archive and carries the
//!    mandatory style bindings.
//! 2. The `Makefile` exposes a `vale` target that syncs and runs Vale.
//!
//! # Mandatory and Optional Steps
//!
//! Release resolution must succeed before any file is touched, so a failed
//! lookup leaves the consumer repository as it was. Reading the optional
//! `stilyagi.toml` manifest out of the release archive never fails an install.
//! Any problem there is logged and replaced by defaults derived from the style
//! name.

pub mod release;

use crate::{
    config::{InstallManifest, Manifest, MANIFEST_FILE_NAME},
    ini::update_vale_ini,
    install::release::{resolve_release, GithubClient, ReleaseClient},
    makefile::update_makefile,
    path::{ensure_parent_dirs, resolve_project_path},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Cursor, Read},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

/// Suffix stripped from repository names to derive style names.
pub const STYLE_SUFFIX: &str = "-vale";

/// GitHub repository reference in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Default style name of the repository.
    pub fn style_name(&self) -> String {
        style_name_for_repo(&self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidRepoRef { reference: reference.into() };
        if reference.matches('/').count() != 1 {
            return Err(invalid());
        }

        let (owner, name) = reference.split_once('/').ok_or_else(invalid)?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self { owner: owner.into(), name: name.into() })
    }
}

impl Display for RepoRef {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}/{}", self.owner, self.name)
    }
}

/// Derive a style name from a repository name.
///
/// Strips [`STYLE_SUFFIX`], unless nothing would be left.
pub fn style_name_for_repo(repo_name: &str) -> String {
    match repo_name.strip_suffix(STYLE_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem.into(),
        _ => repo_name.into(),
    }
}

/// Resolve project root, `.vale.ini`, and `Makefile` paths for installation.
///
/// The project root is anchored at `cwd`, the other two at the project root.
/// Parent directories of both files are created.
///
/// # Errors
///
/// - Return [`Error::Path`] if a path cannot be expanded or a parent
///   directory cannot be created.
pub fn resolve_install_paths(
    cwd: impl AsRef<Path>,
    project_root: impl AsRef<Path>,
    vale_ini: impl AsRef<Path>,
    makefile: impl AsRef<Path>,
) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let root = resolve_project_path(cwd, project_root)?;
    let ini_path = resolve_project_path(&root, vale_ini)?;
    let makefile_path = resolve_project_path(&root, makefile)?;
    ensure_parent_dirs(&ini_path)?;
    ensure_parent_dirs(&makefile_path)?;

    Ok((root, ini_path, makefile_path))
}

/// Everything an installation needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Repository publishing the style pack.
    pub repo: RepoRef,

    /// Default style name, used when the manifest does not name one.
    pub style_name: String,

    /// Vale configuration file to update.
    pub ini_path: PathBuf,

    /// Makefile to update.
    pub makefile_path: PathBuf,

    /// Release version to install instead of the latest one.
    pub override_version: Option<String>,

    /// Release tag to use instead of `v<version>`.
    pub override_tag: Option<String>,

    /// Do not download the archive to look for a manifest.
    pub skip_manifest_download: bool,
}

impl InstallConfig {
    /// Construct new install configuration with defaults for everything else.
    pub fn new(repo: RepoRef, ini_path: impl Into<PathBuf>, makefile_path: impl Into<PathBuf>) -> Self {
        Self {
            style_name: repo.style_name(),
            repo,
            ini_path: ini_path.into(),
            makefile_path: makefile_path.into(),
            override_version: None,
            override_tag: None,
            skip_manifest_download: false,
        }
    }
}

/// Style pack installer.
#[derive(Debug)]
pub struct Installer<C = GithubClient>
where
    C: ReleaseClient,
{
    pub(crate) config: InstallConfig,
    pub(crate) client: C,
}

impl<C> Installer<C>
where
    C: ReleaseClient,
{
    /// Construct new installer.
    pub fn new(config: InstallConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Install the style pack.
    ///
    /// Resolves the release, loads the optional manifest, then rewrites the
    /// `.vale.ini` and `Makefile`. Returns a human readable status line.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Release`] if release resolution fails. Nothing is
    ///   written in that case.
    /// - Return [`Error::Ini`] or [`Error::Makefile`] if either file cannot be
    ///   updated.
    #[instrument(skip(self), fields(repo = %self.config.repo), level = "debug")]
    pub fn run(&self) -> Result<String> {
        let config = &self.config;
        let release = resolve_release(
            &self.client,
            &config.repo,
            &config.style_name,
            config.override_version.as_deref(),
            config.override_tag.as_deref(),
        )?;

        let manifest = if config.skip_manifest_download {
            debug!("manifest download skipped");
            InstallManifest::for_style(config.style_name.as_str())
        } else {
            match self.load_manifest(&release.packages_url) {
                Ok(manifest) => manifest.resolve(&config.style_name),
                Err(error) => {
                    warn!("using default install settings: {error}");
                    InstallManifest::for_style(config.style_name.as_str())
                }
            }
        };

        update_vale_ini(&config.ini_path, &release.packages_url, &manifest)?;
        update_makefile(&config.makefile_path)?;

        let status = format!(
            "Installed {} {} from {} into {} and {}",
            manifest.style_name,
            release.version,
            config.repo,
            config.ini_path.display(),
            config.makefile_path.display(),
        );
        info!("{status}");

        Ok(status)
    }

    /// Download the release archive and read its bundled manifest.
    ///
    /// An archive without a manifest yields an empty one.
    ///
    /// # Errors
    ///
    /// - Return [`EnrichmentError`] for any download, archive, or parse
    ///   failure. Callers are expected to fall back to defaults.
    pub fn load_manifest(&self, packages_url: &str) -> Result<Manifest, EnrichmentError> {
        let archive = self.client.download(packages_url)?;
        match extract_manifest(&archive)? {
            Some(text) => Ok(text.parse()?),
            None => {
                debug!("no {MANIFEST_FILE_NAME} in {packages_url}");
                Ok(Manifest::default())
            }
        }
    }
}

/// Read the first archive member whose name ends with `stilyagi.toml`.
///
/// # Errors
///
/// - Return [`EnrichmentError::Archive`] if the bytes are not a zip archive.
/// - Return [`EnrichmentError::ReadMember`] if the member cannot be read as
///   UTF-8 text.
pub fn extract_manifest(archive: &[u8]) -> Result<Option<String>, EnrichmentError> {
    let mut archive = ZipArchive::new(Cursor::new(archive))?;
    let Some(member) = archive
        .file_names()
        .find(|name| name.ends_with(MANIFEST_FILE_NAME))
        .map(ToString::to_string)
    else {
        return Ok(None);
    };

    let mut text = String::new();
    archive.by_name(&member)?.read_to_string(&mut text)?;
    Ok(Some(text))
}

/// Failure to load the optional manifest.
///
/// Never surfaced from an installation. Installs fall back to defaults.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// Archive cannot be downloaded.
    #[error("failed to download release archive")]
    Download(#[from] release::Error),

    /// Archive cannot be opened.
    #[error("failed to open release archive")]
    Archive(#[from] zip::result::ZipError),

    /// Manifest member cannot be read.
    #[error("failed to read manifest from release archive")]
    ReadMember(#[from] std::io::Error),

    /// Manifest cannot be parsed.
    #[error("failed to parse manifest")]
    Manifest(#[from] crate::config::ConfigError),
}

/// Installation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Repository reference is not `owner/name`.
    #[error("repository reference {reference:?} must be in the form 'owner/name'")]
    InvalidRepoRef { reference: String },

    /// Release resolution fails.
    #[error(transparent)]
    Release(#[from] release::Error),

    /// Path resolution fails.
    #[error(transparent)]
    Path(#[from] crate::path::Error),

    /// Vale configuration cannot be updated.
    #[error(transparent)]
    Ini(#[from] crate::ini::Error),

    /// Makefile cannot be updated.
    #[error(transparent)]
    Makefile(#[from] crate::makefile::Error),
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        match self {
            Self::InvalidRepoRef { .. } => crate::error::ErrorKind::InvalidArgument,
            Self::Release(error) => error.kind(),
            Self::Path(error) => error.kind(),
            Self::Ini(error) => error.kind(),
            Self::Makefile(error) => error.kind(),
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
