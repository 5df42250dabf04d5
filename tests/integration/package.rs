// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{FakeRelease, ProjectFixture};

use anyhow::Result;
use pretty_assertions::assert_eq;
use stilyagi::{
    install::extract_manifest,
    package::{package_styles, resolve_version},
    InstallConfig, Installer, PackageOptions, ValeIni,
};

#[test]
fn packaged_archive_installs_with_its_manifest() -> Result<()> {
    let author = ProjectFixture::new()?;
    author.write("pyproject.toml", "[project]\nname = \"house\"\nversion = \"0.7.0\"\n")?;
    author.write("stilyagi.toml", "[install]\nstyle_name = \"house\"\nmin_alert_level = \"suggestion\"\n")?;
    author.write("styles/house/Headings.yml", "extends: capitalization\n")?;

    let version = resolve_version(author.root(), None)?;
    let archive_path = package_styles(&PackageOptions::new(author.root(), version))?;
    assert_eq!(archive_path, author.path("dist/house-0.7.0.zip"));

    let archive = std::fs::read(&archive_path)?;
    assert!(extract_manifest(&archive)?.is_some());

    let consumer = ProjectFixture::new()?;
    let client = FakeRelease::with_tag("v0.7.0", &["house-0.7.0.zip"])?.serving(archive);
    let config = InstallConfig::new(
        "acme/house-vale".parse()?,
        consumer.path(".vale.ini"),
        consumer.path("Makefile"),
    );
    let installer = Installer::new(config, client);
    installer.run()?;

    let ini: ValeIni = consumer.read(".vale.ini")?.parse()?;
    assert_eq!(ini.root.get("MinAlertLevel").map(String::as_str), Some("suggestion"));
    assert_eq!(
        ini.root.get("Packages").map(String::as_str),
        Some("https://github.com/acme/house-vale/releases/download/v0.7.0/house-0.7.0.zip")
    );

    Ok(())
}
