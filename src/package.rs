// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Style pack packaging.
//!
//! Bundle style directories into a versioned zip archive that Vale can consume
//! through its `Packages` setting. Every archive carries a generated
//! `.vale.ini` at its top level next to the styles themselves:
//!
//! ```text
//! concordat-0.1.0/
//! ├── .vale.ini
//! ├── stilyagi.toml
//! └── styles/
//!     ├── concordat/...
//!     └── config/...
//! ```

use crate::{
    config::MANIFEST_FILE_NAME,
    ini::{Options, ValeIni},
    path::{ensure_parent_dirs, resolve_project_path},
};

use glob::Pattern;
use std::{
    fs::{read_to_string, File},
    io::{copy, Write},
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Default directory holding styles, relative to the project root.
pub const DEFAULT_STYLES_PATH: &str = "styles";

/// Default directory archives are written to, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Version used when no project metadata names one.
pub const UNKNOWN_VERSION: &str = "0.0.0+unknown";

const CONFIG_DIR: &str = "config";
const VOCABULARIES_DIR: &str = "vocabularies";
const INI_FILE_NAME: &str = ".vale.ini";

/// Everything needed to package a style pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    /// Project root every other path is anchored at.
    pub project_root: PathBuf,

    /// Directory holding style directories.
    pub styles_path: PathBuf,

    /// Directory the archive is written to.
    pub output_dir: PathBuf,

    /// Version embedded in the archive name.
    pub version: String,

    /// Style names to include. Empty means every style found.
    pub styles: Vec<String>,

    /// Vocabulary recorded in `.vale.ini`, overriding discovery.
    pub vocabulary: Option<String>,

    /// `StylesPath` recorded in `.vale.ini`.
    pub ini_styles_path: String,

    /// File glob to bind the packaged styles to in `.vale.ini`.
    pub target_glob: Option<String>,

    /// Overwrite an existing archive.
    pub force: bool,
}

impl PackageOptions {
    /// Construct new packaging options with defaults for everything else.
    pub fn new(project_root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            styles_path: DEFAULT_STYLES_PATH.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            version: version.into(),
            styles: Vec::new(),
            vocabulary: None,
            ini_styles_path: DEFAULT_STYLES_PATH.into(),
            target_glob: None,
            force: false,
        }
    }
}

/// Package styles into a zip archive.
///
/// Returns the path of the written archive.
///
/// # Errors
///
/// - Return [`Error::MissingStylesDir`], [`Error::StylesNotFound`], or
///   [`Error::NoStyles`] if there is nothing to package.
/// - Return [`Error::AbsoluteStylesPath`] if the recorded `StylesPath` is not
///   relative.
/// - Return [`Error::ArchiveExists`] if the archive exists and `force` is not
///   set.
/// - Return any I/O or archive error hit while writing.
#[instrument(skip(options), level = "debug")]
pub fn package_styles(options: &PackageOptions) -> Result<PathBuf> {
    let root = &options.project_root;
    let styles_root = resolve_project_path(root, &options.styles_path)?;
    if !styles_root.is_dir() {
        return Err(Error::MissingStylesDir { styles_path: styles_root });
    }
    if Path::new(&options.ini_styles_path).is_absolute() {
        return Err(Error::AbsoluteStylesPath { styles_path: options.ini_styles_path.clone() });
    }

    let styles = discover_styles(&styles_root, &options.styles)?;
    let vocabulary = select_vocabulary(&styles_root, options.vocabulary.as_deref())?;
    let ini = build_ini(
        &options.ini_styles_path,
        vocabulary.as_deref(),
        options.target_glob.as_deref(),
        &styles,
    );

    let stem = format!("{}-{}", styles.join("-"), options.version);
    let output_dir = resolve_project_path(root, &options.output_dir)?;
    let archive_path = output_dir.join(format!("{stem}.zip"));
    if archive_path.exists() && !options.force {
        return Err(Error::ArchiveExists { archive_path });
    }
    ensure_parent_dirs(&archive_path)?;

    let file = File::create(&archive_path).map_err(|err| Error::WriteArchive {
        source: err,
        archive_path: archive_path.clone(),
    })?;
    let mut archive = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    archive.start_file(member_name(&Path::new(&stem).join(INI_FILE_NAME)), opts)?;
    archive
        .write_all(ini.to_string().as_bytes())
        .map_err(|err| Error::WriteArchive { source: err, archive_path: archive_path.clone() })?;

    let members_root = Path::new(&stem).join(&options.ini_styles_path);
    for file_path in collect_style_files(&styles_root, &styles)? {
        let relative = file_path.strip_prefix(&styles_root).unwrap_or(&file_path);
        let name = member_name(&members_root.join(relative));
        debug!("add {name}");
        archive.start_file(name, opts)?;
        let mut reader = File::open(&file_path)
            .map_err(|err| Error::ReadStyleFile { source: err, path: file_path.clone() })?;
        copy(&mut reader, &mut archive)
            .map_err(|err| Error::WriteArchive { source: err, archive_path: archive_path.clone() })?;
    }

    let manifest_path = root.join(MANIFEST_FILE_NAME);
    if manifest_path.is_file() {
        let manifest = read_to_string(&manifest_path)
            .map_err(|err| Error::ReadStyleFile { source: err, path: manifest_path.clone() })?;
        archive.start_file(member_name(&Path::new(&stem).join(MANIFEST_FILE_NAME)), opts)?;
        archive
            .write_all(manifest.as_bytes())
            .map_err(|err| Error::WriteArchive { source: err, archive_path: archive_path.clone() })?;
    }

    archive.finish()?;
    info!("wrote {}", archive_path.display());

    Ok(archive_path)
}

/// Pick the styles to package.
///
/// Explicit names are de-duplicated, sorted, and must each be a directory under
/// `styles_root`. Without explicit names every directory except `config` is a
/// style.
///
/// # Errors
///
/// - Return [`Error::StylesNotFound`] if an explicit style is missing.
/// - Return [`Error::NoStyles`] if discovery finds nothing.
pub fn discover_styles(styles_root: &Path, explicit: &[String]) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        let mut unique = explicit.to_vec();
        unique.sort();
        unique.dedup();

        let missing: Vec<&str> = unique
            .iter()
            .filter(|name| !styles_root.join(name).is_dir())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(Error::StylesNotFound {
                styles_path: styles_root.into(),
                missing: missing.join(", "),
            });
        }

        return Ok(unique);
    }

    let discovered: Vec<String> = list_dirs(styles_root)?
        .into_iter()
        .filter(|name| name != CONFIG_DIR)
        .collect();
    if discovered.is_empty() {
        return Err(Error::NoStyles { styles_path: styles_root.into() });
    }

    Ok(discovered)
}

/// Pick the vocabulary recorded in `.vale.ini`.
///
/// Uses the override when given, otherwise the only vocabulary under
/// `config/vocabularies`. Zero or several vocabularies select none.
///
/// # Errors
///
/// - Return [`Error::Glob`] or [`Error::Walk`] if listing directories fails.
pub fn select_vocabulary(styles_root: &Path, vocabulary: Option<&str>) -> Result<Option<String>> {
    if let Some(vocabulary) = vocabulary.filter(|vocabulary| !vocabulary.is_empty()) {
        return Ok(Some(vocabulary.into()));
    }

    let vocab_root = styles_root.join(CONFIG_DIR).join(VOCABULARIES_DIR);
    if !vocab_root.is_dir() {
        return Ok(None);
    }

    let mut names = list_dirs(&vocab_root)?;
    Ok(if names.len() == 1 { names.pop() } else { None })
}

/// Build the `.vale.ini` shipped inside an archive.
pub fn build_ini(
    styles_path: &str,
    vocabulary: Option<&str>,
    target_glob: Option<&str>,
    styles: &[String],
) -> ValeIni {
    let mut ini = ValeIni::new();
    ini.root.insert("StylesPath".into(), styles_path.into());
    if let Some(vocabulary) = vocabulary {
        ini.root.insert("Vocab".into(), vocabulary.into());
    }

    if let Some(target_glob) = target_glob.filter(|target_glob| !target_glob.is_empty()) {
        let mut section = Options::new();
        section.insert("BasedOnStyles".into(), styles.join(", "));
        ini.sections.insert(target_glob.into(), section);
    }

    ini
}

/// Work out the version embedded in the archive name.
///
/// An explicit override wins, then `[project].version` from `pyproject.toml`,
/// then `[package].version` from `Cargo.toml`, then [`UNKNOWN_VERSION`].
///
/// # Errors
///
/// - Return [`Error::ReadMetadata`] or [`Error::ParseMetadata`] if a present
///   metadata file cannot be read or parsed.
pub fn resolve_version(project_root: &Path, version: Option<&str>) -> Result<String> {
    if let Some(version) = version.map(str::trim).filter(|version| !version.is_empty()) {
        return Ok(version.into());
    }

    let candidates = [("pyproject.toml", "project"), ("Cargo.toml", "package")];
    for (file_name, table) in candidates {
        if let Some(version) = read_metadata_version(&project_root.join(file_name), table)? {
            debug!("version {version} from {file_name}");
            return Ok(version);
        }
    }

    Ok(UNKNOWN_VERSION.into())
}

fn read_metadata_version(path: &Path, table: &str) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }

    let text = read_to_string(path).map_err(|err| Error::ReadMetadata {
        source: err,
        path: path.into(),
    })?;
    let document: toml::Table = toml::de::from_str(&text).map_err(|err| Error::ParseMetadata {
        source: err,
        path: path.into(),
    })?;

    let version = document
        .get(table)
        .and_then(|table| table.get("version"))
        .and_then(|version| version.as_str())
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(ToString::to_string);

    Ok(version)
}

/// Sorted names of the directories directly under `dir`.
fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut names = Vec::new();
    for entry in glob::glob(&pattern)? {
        let entry = entry?;
        if entry.is_dir() {
            if let Some(name) = entry.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();

    Ok(names)
}

/// Every file of the selected styles and of `config`, each directory sorted.
fn collect_style_files(styles_root: &Path, styles: &[String]) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = styles.iter().map(|style| styles_root.join(style)).collect();
    let config_dir = styles_root.join(CONFIG_DIR);
    if config_dir.is_dir() {
        dirs.push(config_dir);
    }

    let mut files = Vec::new();
    for dir in dirs {
        let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));
        let mut found = Vec::new();
        for entry in glob::glob(&pattern)? {
            let entry = entry?;
            if entry.is_file() {
                found.push(entry);
            }
        }
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

/// Archive member name with forward slashes and no `.` components.
fn member_name(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Packaging error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Styles directory does not exist.
    #[error("styles directory {:?} does not exist", styles_path.display())]
    MissingStylesDir { styles_path: PathBuf },

    /// Explicitly requested styles are missing.
    #[error("styles not found under {:?}: {missing}", styles_path.display())]
    StylesNotFound { styles_path: PathBuf, missing: String },

    /// Styles directory holds no styles.
    #[error("no styles found under {:?}", styles_path.display())]
    NoStyles { styles_path: PathBuf },

    /// Recorded styles path is absolute.
    #[error("StylesPath inside the archive must be a relative directory, got {styles_path:?}")]
    AbsoluteStylesPath { styles_path: String },

    /// Archive already exists.
    #[error("archive {:?} already exists, rerun with --force to overwrite", archive_path.display())]
    ArchiveExists { archive_path: PathBuf },

    /// Path resolution fails.
    #[error(transparent)]
    Path(#[from] crate::path::Error),

    /// Directory listing pattern is invalid.
    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    /// Directory listing fails.
    #[error(transparent)]
    Walk(#[from] glob::GlobError),

    /// Style file cannot be read from.
    #[error("failed to read {:?}", path.display())]
    ReadStyleFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Archive cannot be written to.
    #[error("failed to write archive {:?}", archive_path.display())]
    WriteArchive {
        #[source]
        source: std::io::Error,
        archive_path: PathBuf,
    },

    /// Archive encoding fails.
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    /// Project metadata cannot be read from.
    #[error("failed to read project metadata {:?}", path.display())]
    ReadMetadata {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Project metadata cannot be parsed.
    #[error("failed to parse project metadata {:?}", path.display())]
    ParseMetadata {
        #[source]
        source: toml::de::Error,
        path: PathBuf,
    },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        use crate::error::ErrorKind;

        match self {
            Self::MissingStylesDir { .. } | Self::StylesNotFound { .. } | Self::NoStyles { .. } => {
                ErrorKind::NotFound
            }
            Self::AbsoluteStylesPath { .. } | Self::ArchiveExists { .. } | Self::Glob(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Path(error) => error.kind(),
            Self::ParseMetadata { .. } => ErrorKind::MalformedInput,
            Self::Walk(_)
            | Self::ReadStyleFile { .. }
            | Self::WriteArchive { .. }
            | Self::Zip(_)
            | Self::ReadMetadata { .. } => ErrorKind::Io,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::{fs, io::Read};
    use zip::ZipArchive;

    fn write(root: &Path, relative: &str, content: &str) -> anyhow::Result<()> {
        let path = root.join(relative);
        ensure_parent_dirs(&path)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn styles_fixture() -> anyhow::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        write(dir.path(), "styles/concordat/Acronyms.yml", "extends: conditional\n")?;
        write(dir.path(), "styles/concordat/Pronouns.yml", "extends: existence\n")?;
        write(dir.path(), "styles/config/vocabularies/concordat/accept.txt", "Vale\n")?;
        Ok(dir)
    }

    fn archive_members(path: &Path) -> anyhow::Result<Vec<String>> {
        let archive = ZipArchive::new(File::open(path)?)?;
        Ok(archive.file_names().map(ToString::to_string).collect())
    }

    #[test]
    fn package_styles_layout() -> anyhow::Result<()> {
        let dir = styles_fixture()?;
        write(dir.path(), "stilyagi.toml", "[install]\nstyle_name = \"concordat\"\n")?;

        let archive_path = package_styles(&PackageOptions::new(dir.path(), "1.2.3"))?;
        assert_eq!(archive_path, dir.path().join("dist/concordat-1.2.3.zip"));

        let mut members = archive_members(&archive_path)?;
        members.sort();
        assert_eq!(
            members,
            [
                "concordat-1.2.3/.vale.ini",
                "concordat-1.2.3/stilyagi.toml",
                "concordat-1.2.3/styles/concordat/Acronyms.yml",
                "concordat-1.2.3/styles/concordat/Pronouns.yml",
                "concordat-1.2.3/styles/config/vocabularies/concordat/accept.txt",
            ]
        );

        let mut archive = ZipArchive::new(File::open(&archive_path)?)?;
        let mut ini = String::new();
        archive.by_name("concordat-1.2.3/.vale.ini")?.read_to_string(&mut ini)?;
        assert_eq!(ini, "Vocab = concordat\nStylesPath = styles\n");

        Ok(())
    }

    #[test]
    fn package_styles_refuses_overwrite_without_force() -> anyhow::Result<()> {
        let dir = styles_fixture()?;
        let mut options = PackageOptions::new(dir.path(), "1.0.0");
        package_styles(&options)?;

        let err = package_styles(&options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        options.force = true;
        package_styles(&options)?;

        Ok(())
    }

    #[test]
    fn package_styles_custom_styles_path_and_glob() -> anyhow::Result<()> {
        let dir = styles_fixture()?;
        let mut options = PackageOptions::new(dir.path(), "2.0.0");
        options.ini_styles_path = ".vale/styles".into();
        options.target_glob = Some("*.md".into());
        options.vocabulary = Some("house".into());

        let archive_path = package_styles(&options)?;
        let members = archive_members(&archive_path)?;
        assert!(members.contains(&"concordat-2.0.0/.vale/styles/concordat/Acronyms.yml".to_string()));

        let mut archive = ZipArchive::new(File::open(&archive_path)?)?;
        let mut ini = String::new();
        archive.by_name("concordat-2.0.0/.vale.ini")?.read_to_string(&mut ini)?;
        let expect = indoc! {"
            Vocab = house
            StylesPath = .vale/styles

            [*.md]
            BasedOnStyles = concordat
        "};
        assert_eq!(ini, expect);

        Ok(())
    }

    #[test]
    fn package_styles_rejects_absolute_styles_path() -> anyhow::Result<()> {
        let dir = styles_fixture()?;
        let mut options = PackageOptions::new(dir.path(), "1.0.0");
        options.ini_styles_path = "/styles".into();

        let err = package_styles(&options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        Ok(())
    }

    #[test]
    fn discover_styles_explicit_and_implicit() -> anyhow::Result<()> {
        let dir = styles_fixture()?;
        fs::create_dir_all(dir.path().join("styles/alpha"))?;
        let styles_root = dir.path().join("styles");

        assert_eq!(discover_styles(&styles_root, &[])?, ["alpha", "concordat"]);

        let explicit = vec!["concordat".to_string(), "alpha".into(), "concordat".into()];
        assert_eq!(discover_styles(&styles_root, &explicit)?, ["alpha", "concordat"]);

        let explicit = vec!["missing".to_string(), "concordat".into(), "gone".into()];
        let err = discover_styles(&styles_root, &explicit).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().ends_with("gone, missing"));

        Ok(())
    }

    #[test]
    fn discover_styles_needs_at_least_one() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("config"))?;

        let err = discover_styles(dir.path(), &[]).unwrap_err();
        assert!(matches!(err, Error::NoStyles { .. }));

        Ok(())
    }

    #[test]
    fn select_vocabulary_only_when_unambiguous() -> anyhow::Result<()> {
        let dir = styles_fixture()?;
        let styles_root = dir.path().join("styles");

        assert_eq!(select_vocabulary(&styles_root, None)?, Some("concordat".into()));
        assert_eq!(select_vocabulary(&styles_root, Some("house"))?, Some("house".into()));

        fs::create_dir_all(styles_root.join("config/vocabularies/other"))?;
        assert_eq!(select_vocabulary(&styles_root, None)?, None);

        Ok(())
    }

    #[test]
    fn resolve_version_precedence() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(resolve_version(dir.path(), None)?, UNKNOWN_VERSION);

        write(dir.path(), "Cargo.toml", "[package]\nname = \"x\"\nversion = \"0.3.0\"\n")?;
        assert_eq!(resolve_version(dir.path(), None)?, "0.3.0");

        write(dir.path(), "pyproject.toml", "[project]\nversion = \" 0.2.0 \"\n")?;
        assert_eq!(resolve_version(dir.path(), None)?, "0.2.0");

        assert_eq!(resolve_version(dir.path(), Some("9.9.9"))?, "9.9.9");

        Ok(())
    }
}
