// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Every file stilyagi touches is named relative to a project root, unless the
//! caller hands over an absolute path. Paths may use `~` and environment
//! variables, which are expanded before anchoring.

use std::{
    fs::create_dir_all,
    path::{Component, Path, PathBuf},
};

/// Resolve `candidate` into an absolute path anchored at `root`.
///
/// Expands `~` and environment variables, joins relative results onto `root`,
/// and folds `.` and `..` components lexically. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`Error::ShellExpansion`] if a referenced variable is not set.
/// - Return [`Error::NonUnicode`] if the path cannot be expanded as text.
pub fn resolve_project_path(root: impl AsRef<Path>, candidate: impl AsRef<Path>) -> Result<PathBuf> {
    let candidate = candidate.as_ref();
    let text = candidate.to_str().ok_or_else(|| Error::NonUnicode {
        path: candidate.to_path_buf(),
    })?;
    let expanded = PathBuf::from(shellexpand::full(text)?.into_owned());

    let anchored = if expanded.is_absolute() {
        expanded
    } else {
        root.as_ref().join(expanded)
    };

    Ok(normalize(&anchored))
}

/// Create every missing parent directory of `path`.
///
/// # Errors
///
/// - Return [`Error::CreateParent`] if a directory cannot be created.
pub fn ensure_parent_dirs(path: impl AsRef<Path>) -> Result<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            create_dir_all(parent).map_err(|err| Error::CreateParent {
                source: err,
                path: parent.to_path_buf(),
            })
        }
        _ => Ok(()),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normal = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    normal
}

/// Path resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Shell expansion of a path fails.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Path is not valid UTF-8.
    #[error("path {:?} is not valid unicode", path.display())]
    NonUnicode { path: PathBuf },

    /// Parent directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateParent {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        use crate::error::ErrorKind;

        match self {
            Self::ShellExpansion(_) | Self::NonUnicode { .. } => ErrorKind::InvalidArgument,
            Self::CreateParent { .. } => ErrorKind::Io,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
