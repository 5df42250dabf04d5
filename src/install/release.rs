// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release resolution.
//!
//! Style packs are published as GitHub release assets. Before anything on disk
//! changes, the installer works out which release to use and where its archive
//! can be downloaded from. Lookup failures are never retried.

use crate::install::RepoRef;

use indicatif::ProgressBar;
use reqwest::{
    blocking::Client,
    header::{ACCEPT, USER_AGENT},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default base URL of the GitHub REST API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Base URL release assets are downloaded from.
pub const DOWNLOAD_BASE: &str = "https://github.com";

const API_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const CLIENT_AGENT: &str = concat!("stilyagi/", env!("CARGO_PKG_VERSION"));

/// Release payload, trimmed down to the fields stilyagi cares about.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: Option<String>,
    pub assets: Option<Vec<Asset>>,
}

/// Asset attached to a release.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: Option<String>,
}

/// Source of release metadata and archive bytes.
pub trait ReleaseClient {
    /// Fetch the latest published release of a repository.
    fn latest_release(&self, repo: &RepoRef) -> Result<Release>;

    /// Download raw bytes from a URL.
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Release client talking to GitHub over blocking HTTP.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_base: String,
    token: Option<String>,
    bar: ProgressBar,
}

impl GithubClient {
    /// Construct new GitHub client with optional bearer token.
    ///
    /// # Errors
    ///
    /// - Return [`Error::BuildClient`] if the HTTP client cannot be set up.
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(CLIENT_AGENT)
            .build()
            .map_err(Error::BuildClient)?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.into(),
            token: token.filter(|token| !token.trim().is_empty()),
            bar: ProgressBar::hidden(),
        })
    }

    /// Use a different API base URL.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InsecureApiBase`] if the URL does not use `https://`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Result<Self> {
        let api_base = api_base.into();
        if !api_base.starts_with("https://") {
            return Err(Error::InsecureApiBase { api_base });
        }

        self.api_base = api_base.trim_end_matches('/').into();
        Ok(self)
    }

    /// Report network activity through a progress bar.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }
}

impl ReleaseClient for GithubClient {
    #[instrument(skip(self), level = "debug")]
    fn latest_release(&self, repo: &RepoRef) -> Result<Release> {
        let url = format!("{}/repos/{}/{}/releases/latest", self.api_base, repo.owner, repo.name);
        self.bar.set_message(format!("looking up latest release of {repo}"));

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_AGENT)
            .timeout(API_TIMEOUT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body = request
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|err| Error::Request { source: err, url: url.clone() })?;

        serde_json::from_slice(&body).map_err(|err| Error::Decode { source: err, url })
    }

    #[instrument(skip(self), level = "debug")]
    fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.bar.set_message(format!("downloading {url}"));

        let body = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|err| Error::Request { source: err, url: url.into() })?;
        debug!("downloaded {} bytes", body.len());

        Ok(body.to_vec())
    }
}

/// Concrete release chosen for installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub version: String,
    pub tag: String,
    pub packages_url: String,
}

/// Work out version, tag, and archive URL of the release to install.
///
/// An explicit version skips the remote lookup entirely. Its tag defaults to
/// `v<version>` and its asset to `<style>-<version>.zip`. Blank overrides
/// count as absent.
///
/// # Errors
///
/// - Return [`Error::Request`] or [`Error::Decode`] if the lookup fails.
/// - Return [`Error::MissingTag`] if the release carries no tag.
#[instrument(skip(client), level = "debug")]
pub fn resolve_release(
    client: &impl ReleaseClient,
    repo: &RepoRef,
    style_name: &str,
    override_version: Option<&str>,
    override_tag: Option<&str>,
) -> Result<ResolvedRelease> {
    let override_version = override_version.filter(|version| !version.trim().is_empty());
    let override_tag = override_tag.filter(|tag| !tag.trim().is_empty());
    let (version, tag, asset) = match override_version {
        Some(version) => {
            let tag = override_tag.map_or_else(|| format!("v{version}"), ToString::to_string);
            (version.to_string(), tag, format!("{style_name}-{version}.zip"))
        }
        None => {
            let release = client.latest_release(repo)?;
            let tag = release
                .tag_name
                .as_deref()
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .ok_or_else(|| Error::MissingTag { repo: repo.to_string() })?
                .to_string();
            let version = strip_version_prefix(&tag).to_string();
            let asset = pick_asset_name(&release, &format!("{style_name}-{version}.zip"));
            (version, tag, asset)
        }
    };

    let packages_url = format!("{DOWNLOAD_BASE}/{repo}/releases/download/{tag}/{asset}");
    info!("resolved {repo} release {tag} at {packages_url}");

    Ok(ResolvedRelease { version, tag, packages_url })
}

/// Strip a single leading `v` or `V` from a tag.
pub fn strip_version_prefix(tag: &str) -> &str {
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// Pick the asset to download from a release.
///
/// Prefers `expected` when listed, then the first `.zip` asset, and finally
/// falls back to `expected` anyway.
pub fn pick_asset_name(release: &Release, expected: &str) -> String {
    let names = release
        .assets
        .iter()
        .flatten()
        .filter_map(|asset| asset.name.as_deref());

    let mut first_zip = None;
    for name in names {
        if name == expected {
            return name.to_string();
        }
        if first_zip.is_none() && name.ends_with(".zip") {
            first_zip = Some(name);
        }
    }

    first_zip.unwrap_or(expected).to_string()
}

/// Release resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client cannot be constructed.
    #[error("failed to set up HTTP client")]
    BuildClient(#[source] reqwest::Error),

    /// API base URL is not https.
    #[error("release API base {api_base:?} must use https://")]
    InsecureApiBase { api_base: String },

    /// Request fails in transit or with a non-success status.
    #[error("request to {url} failed")]
    Request {
        #[source]
        source: reqwest::Error,
        url: String,
    },

    /// Release payload is not valid JSON.
    #[error("malformed release payload from {url}")]
    Decode {
        #[source]
        source: serde_json::Error,
        url: String,
    },

    /// Release payload has no tag.
    #[error("latest release of {repo} is missing tag_name")]
    MissingTag { repo: String },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        use crate::error::ErrorKind;

        match self {
            Self::BuildClient(_) | Self::Request { .. } => ErrorKind::TransientExternal,
            Self::InsecureApiBase { .. } => ErrorKind::InvalidArgument,
            Self::Decode { .. } | Self::MissingTag { .. } => ErrorKind::MalformedInput,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
