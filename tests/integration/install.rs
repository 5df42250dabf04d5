// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{zip_archive, FakeRelease, ProjectFixture};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use stilyagi::{ErrorKind, InstallConfig, Installer, ValeIni};

const URL: &str = "https://github.com/leynos/concordat-vale/releases/download/v0.4.0/concordat-0.4.0.zip";

fn config(project: &ProjectFixture) -> Result<InstallConfig> {
    Ok(InstallConfig::new(
        "leynos/concordat-vale".parse()?,
        project.path(".vale.ini"),
        project.path("Makefile"),
    ))
}

#[test]
fn install_rewrites_ini_and_makefile() -> Result<()> {
    let project = ProjectFixture::new()?;
    project.write(".vale.ini", "StylesPath = styles\n\n[legacy]\nKeep = me\n")?;
    project.write("Makefile", ".PHONY: test\n\ntest:\n\tcargo test\n")?;
    let client = FakeRelease::with_tag("v0.4.0", &["concordat-0.4.0.zip"])?;

    let status = Installer::new(config(&project)?, client).run()?;

    assert_eq!(
        status,
        format!(
            "Installed concordat 0.4.0 from leynos/concordat-vale into {} and {}",
            project.path(".vale.ini").display(),
            project.path("Makefile").display(),
        )
    );

    let ini: ValeIni = project.read(".vale.ini")?.parse()?;
    assert_eq!(ini.root.get("Packages").map(String::as_str), Some(URL));
    assert_eq!(ini.root.get("StylesPath").map(String::as_str), Some("styles"));
    assert_eq!(ini.sections["legacy"].get("Keep").map(String::as_str), Some("me"));
    assert_eq!(ini.sections["README.md"].get("concordat.Pronouns").map(String::as_str), Some("NO"));

    let expect = indoc! {"
        VALE ?= vale

        .PHONY: test vale

        test:
        \tcargo test

        vale: $(VALE) $(ACRONYM_SCRIPT) ## Check prose
        \t$(VALE) sync
        \t$(VALE) --no-global .
    "};
    assert_eq!(project.read("Makefile")?, expect);

    Ok(())
}

#[test]
fn install_twice_is_idempotent() -> Result<()> {
    let project = ProjectFixture::new()?;
    project.write(".vale.ini", "StylesPath = styles\n")?;

    let client = FakeRelease::with_tag("v0.4.0", &[])?;
    Installer::new(config(&project)?, client).run()?;
    let ini = project.read(".vale.ini")?;
    let makefile = project.read("Makefile")?;

    let client = FakeRelease::with_tag("v0.4.0", &[])?;
    Installer::new(config(&project)?, client).run()?;
    assert_eq!(project.read(".vale.ini")?, ini);
    assert_eq!(project.read("Makefile")?, makefile);

    Ok(())
}

#[test]
fn install_uses_bundled_manifest() -> Result<()> {
    let project = ProjectFixture::new()?;
    let archive = zip_archive(&[
        ("concordat-0.4.0/.vale.ini", "StylesPath = styles\n"),
        (
            "concordat-0.4.0/stilyagi.toml",
            indoc! {r#"
                [install]
                style_name = "house"
                vocab = "house-words"
                min_alert_level = "error"
            "#},
        ),
    ])?;
    let client = FakeRelease::with_tag("v0.4.0", &["concordat-0.4.0.zip"])?.serving(archive);

    let installer = Installer::new(config(&project)?, client);
    let status = installer.run()?;
    assert!(status.starts_with("Installed house 0.4.0 from leynos/concordat-vale"));

    let ini: ValeIni = project.read(".vale.ini")?.parse()?;
    assert_eq!(ini.root.get("Vocab").map(String::as_str), Some("house-words"));
    assert_eq!(ini.root.get("MinAlertLevel").map(String::as_str), Some("error"));
    assert_eq!(ini.sections["AGENTS.md"].get("BasedOnStyles").map(String::as_str), Some("house"));

    Ok(())
}

#[test]
fn install_keeps_valid_manifest_fields() -> Result<()> {
    let project = ProjectFixture::new()?;
    let archive = zip_archive(&[(
        "concordat-0.4.0/stilyagi.toml",
        "[install]\nstyle_name = \"house\"\nmin_alert_level = 3\n",
    )])?;
    let client = FakeRelease::with_tag("v0.4.0", &[])?.serving(archive);

    let status = Installer::new(config(&project)?, client).run()?;
    assert!(status.starts_with("Installed house 0.4.0"));

    let ini: ValeIni = project.read(".vale.ini")?.parse()?;
    assert_eq!(ini.root.get("Vocab").map(String::as_str), Some("house"));
    assert_eq!(ini.root.get("MinAlertLevel").map(String::as_str), Some("warning"));

    Ok(())
}

#[test]
fn install_falls_back_when_manifest_is_unusable() -> Result<()> {
    let project = ProjectFixture::new()?;
    let archive = zip_archive(&[("concordat-0.4.0/stilyagi.toml", "[install\nbroken")])?;
    let client = FakeRelease::with_tag("v0.4.0", &[])?.serving(archive);

    let status = Installer::new(config(&project)?, client).run()?;
    assert!(status.starts_with("Installed concordat 0.4.0"));

    // Not even a zip archive.
    let client = FakeRelease::with_tag("v0.4.0", &[])?.serving(b"garbage".to_vec());
    let status = Installer::new(config(&project)?, client).run()?;
    assert!(status.starts_with("Installed concordat 0.4.0"));

    let ini: ValeIni = project.read(".vale.ini")?.parse()?;
    assert_eq!(ini.root.get("Vocab").map(String::as_str), Some("concordat"));
    assert_eq!(ini.root.get("MinAlertLevel").map(String::as_str), Some("warning"));

    Ok(())
}

#[test]
fn install_with_override_and_skipped_manifest_stays_offline() -> Result<()> {
    let project = ProjectFixture::new()?;
    let mut config = config(&project)?;
    config.override_version = Some("1.0.0".into());
    config.skip_manifest_download = true;
    let client = FakeRelease::default();

    let installer = Installer::new(config, client);
    let status = installer.run()?;

    assert!(status.starts_with("Installed concordat 1.0.0"));
    let ini: ValeIni = project.read(".vale.ini")?.parse()?;
    assert_eq!(
        ini.root.get("Packages").map(String::as_str),
        Some("https://github.com/leynos/concordat-vale/releases/download/v1.0.0/concordat-1.0.0.zip")
    );

    Ok(())
}

#[test]
fn failed_release_lookup_writes_nothing() -> Result<()> {
    let project = ProjectFixture::new()?;
    project.write(".vale.ini", "StylesPath = styles\n")?;

    let err = Installer::new(config(&project)?, FakeRelease::default()).run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(project.read(".vale.ini")?, "StylesPath = styles\n");
    assert!(!project.path("Makefile").exists());

    Ok(())
}
