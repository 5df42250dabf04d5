// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package and install Vale style packs.
//!
//! A __style pack__ is a bundle of Vale rule files, usually a house style,
//! that consumer repositories pull in through Vale's `Packages` setting.
//! Stilyagi covers both ends of that exchange:
//!
//! 1. [`package`] zips style directories into a versioned archive that ships
//!    its own generated `.vale.ini`.
//! 2. [`install`] resolves the latest published release of a pack and rewrites
//!    a consumer's `.vale.ini` and `Makefile` to use it.
//! 3. [`tengo`] keeps allow lists embedded in Tengo scripts in sync with
//!    curated source lists.
//!
//! # Idempotent Rewrites
//!
//! Every file stilyagi rewrites is parsed, changed in memory, and rendered
//! back in full. Running the same operation twice never produces a further
//! diff, and content stilyagi does not own is carried through untouched.

pub mod config;
pub mod error;
pub mod ini;
pub mod install;
pub mod makefile;
pub mod package;
pub mod path;
pub mod tengo;
pub mod value;

pub use config::{InstallManifest, Manifest};
pub use error::ErrorKind;
pub use ini::ValeIni;
pub use install::{
    release::{GithubClient, ReleaseClient},
    InstallConfig, Installer, RepoRef,
};
pub use makefile::MakefileEdit;
pub use package::PackageOptions;
pub use tengo::{source::MapValueType, MapUpdate};
pub use value::Value;
