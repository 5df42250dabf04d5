// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use std::{
    cell::RefCell,
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};
use stilyagi::{
    install::release::{Error as ReleaseError, Release, Result as ReleaseResult},
    ReleaseClient, RepoRef,
};
use tempfile::TempDir;
use zip::{write::SimpleFileOptions, ZipWriter};

/// Temporary project directory.
pub(crate) struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self { dir: tempfile::tempdir()? })
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub(crate) fn write(&self, relative: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents.as_ref())?;
        Ok(path)
    }

    pub(crate) fn read(&self, relative: impl AsRef<Path>) -> Result<String> {
        Ok(fs::read_to_string(self.path(relative))?)
    }
}

/// Release client serving canned data from memory.
#[derive(Default)]
pub(crate) struct FakeRelease {
    pub(crate) release: Option<Release>,
    pub(crate) archive: Option<Vec<u8>>,
    pub(crate) lookups: RefCell<Vec<String>>,
    pub(crate) downloads: RefCell<Vec<String>>,
}

impl FakeRelease {
    pub(crate) fn with_tag(tag: &str, assets: &[&str]) -> Result<Self> {
        let assets: Vec<_> = assets.iter().map(|name| serde_json::json!({ "name": name })).collect();
        let release = serde_json::from_value(serde_json::json!({ "tag_name": tag, "assets": assets }))?;
        Ok(Self { release: Some(release), ..Self::default() })
    }

    pub(crate) fn serving(mut self, archive: Vec<u8>) -> Self {
        self.archive = Some(archive);
        self
    }
}

impl ReleaseClient for FakeRelease {
    fn latest_release(&self, repo: &RepoRef) -> ReleaseResult<Release> {
        self.lookups.borrow_mut().push(repo.to_string());
        self.release.clone().ok_or_else(|| ReleaseError::MissingTag { repo: repo.to_string() })
    }

    fn download(&self, url: &str) -> ReleaseResult<Vec<u8>> {
        self.downloads.borrow_mut().push(url.to_string());
        Ok(self.archive.clone().unwrap_or_default())
    }
}

/// Build a zip archive in memory.
pub(crate) fn zip_archive(members: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in members {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(contents.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}
