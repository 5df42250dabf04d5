// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::ProjectFixture;

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use stilyagi::{
    tengo::{source::parse_source_entries, update_tengo_map},
    ErrorKind, MapUpdate, MapValueType,
};

#[test]
fn merge_source_list_into_empty_map() -> Result<()> {
    let project = ProjectFixture::new()?;
    let source = project.write("acronyms.txt", "ALPHA\nBETA   # trailing\nALPHA\n")?;
    let script = project.write("Acronyms.tengo", "allow := {\n}\n")?;

    let (provided, entries) = parse_source_entries(&source, MapValueType::True)?;
    let result = update_tengo_map(&script, "allow", &entries)?;

    assert_eq!(provided, 3);
    assert_eq!(result, MapUpdate { updated: 2, wrote_file: true });
    let expect = indoc! {r#"
        allow := {
          "ALPHA": true,
          "BETA": true,
        }
    "#};
    assert_eq!(project.read("Acronyms.tengo")?, expect);

    // Second run is a no-op.
    let result = update_tengo_map(&script, "allow", &entries)?;
    assert_eq!(result, MapUpdate { updated: 0, wrote_file: false });

    Ok(())
}

#[test]
fn numeric_source_keeps_equal_values() -> Result<()> {
    let project = ProjectFixture::new()?;
    let source = project.write("limits.txt", "X=10.0\nY=2\n")?;
    let script = project.write(
        "Limits.tengo",
        indoc! {r#"
            limits := {
                "X": 10, // ten
            }
        "#},
    )?;

    let (_, entries) = parse_source_entries(&source, MapValueType::Number)?;
    let result = update_tengo_map(&script, "limits", &entries)?;

    assert_eq!(result.updated, 1);
    let expect = indoc! {r#"
        limits := {
            "X": 10, // ten
            "Y": 2,
        }
    "#};
    assert_eq!(project.read("Limits.tengo")?, expect);

    Ok(())
}

#[test]
fn malformed_numeric_source_writes_nothing() -> Result<()> {
    let project = ProjectFixture::new()?;
    let source = project.write("limits.txt", "beta=1\nalpha=abc\n")?;
    let script = project.write("Limits.tengo", "allow := {\n}\n")?;

    let err = parse_source_entries(&source, MapValueType::Number).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(std::fs::read_to_string(script)?, "allow := {\n}\n");

    Ok(())
}
