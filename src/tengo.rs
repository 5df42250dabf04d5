// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tengo map literal management.
//!
//! Vale scripts written in Tengo carry allow lists as flat map literals, e.g.,
//!
//! ```text
//! allow := {
//!   "API": true,
//!   "CLI": true, // command line
//! }
//! ```
//!
//! Stilyagi merges entries from curated source files into such maps while
//! leaving everything it does not own byte for byte intact. Only flat maps are
//! supported: every entry sits on its own line and ends with a trailing comma.
//!
//! # Brace Counting
//!
//! The end of a map is found by counting braces line by line. Braces inside
//! string literals or comments are counted too, so maps that contain them may
//! be mis-delimited. Keep braces out of allow list keys and comments.

pub mod source;

use crate::value::Value;

use indexmap::IndexMap;
use regex::Regex;
use std::{
    collections::HashMap,
    fs::{read_to_string, write},
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, info, instrument};

/// Map updated when a destination does not name one.
pub const DEFAULT_MAP_NAME: &str = "allow";

const DEST_SEPARATOR: &str = "::";

static ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // INVARIANT: Pattern is a constant known to be valid.
    Regex::new(
        r#"^(?P<indent>\s*)"(?P<key>(?:[^"\\]|\\.)+)"\s*:\s*(?P<value>.*),(?P<comment>\s*//.*)?\s*$"#,
    )
    .expect("entry pattern is valid")
});

/// Existing entry of a map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Line index of the entry.
    pub index: usize,

    /// Leading whitespace of the entry line.
    pub indent: String,

    /// Trailing `//` comment including its leading whitespace, or empty.
    pub comment: String,

    /// Literal text of the value as written.
    pub raw_value: String,

    /// Parsed value.
    pub value: Value,
}

/// Outcome of a map update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapUpdate {
    /// Number of entries that were added or changed.
    pub updated: usize,

    /// Whether the script was rewritten on disk.
    pub wrote_file: bool,
}

/// Split a `path::map` destination into its parts.
///
/// The map name defaults to [`DEFAULT_MAP_NAME`] when omitted.
///
/// # Errors
///
/// - Return [`Error::EmptyDestination`] if the path part is empty.
pub fn split_dest(dest: &str) -> Result<(PathBuf, String)> {
    let (path, map_name) = dest.split_once(DEST_SEPARATOR).unwrap_or((dest, ""));

    if path.is_empty() {
        return Err(Error::EmptyDestination { dest: dest.into() });
    }

    let map_name = if map_name.is_empty() { DEFAULT_MAP_NAME } else { map_name };
    Ok((PathBuf::from(path), map_name.to_string()))
}

/// Locate the header line of a named map.
///
/// Header must be of the form `<indent><name> := {` with nothing trailing.
///
/// # Errors
///
/// - Return [`Error::MapNotFound`] if no header line matches.
pub fn find_map_header(lines: &[String], map_name: &str) -> Result<(usize, String)> {
    let pattern = Regex::new(&format!(r"^(?P<indent>\s*){}\s*:=\s*\{{\s*$", regex::escape(map_name)))
        .map_err(|_| Error::MapNotFound { map_name: map_name.into() })?;

    lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| {
            pattern.captures(line).map(|caps| (index, caps["indent"].to_string()))
        })
        .ok_or_else(|| Error::MapNotFound { map_name: map_name.into() })
}

/// Locate the closing line of a map whose header sits at `start`.
///
/// # Errors
///
/// - Return [`Error::UnclosedMap`] if brace depth never drops back to zero.
pub fn find_map_end(lines: &[String], start: usize) -> Result<usize> {
    let mut depth: isize = 1;
    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        depth += line.matches('{').count() as isize;
        depth -= line.matches('}').count() as isize;
        if depth == 0 {
            return Ok(index);
        }
    }

    Err(Error::UnclosedMap { header_line: start + 1 })
}

/// Collect entries between `start` and `end` along with entry indentation.
///
/// Indentation is taken from the first entry, or derived from the map header
/// when the map is empty. A key listed twice keeps its last occurrence.
pub fn collect_entries(
    lines: &[String],
    start: usize,
    end: usize,
    map_indent: &str,
) -> (HashMap<String, MapEntry>, String) {
    let mut entries = HashMap::new();
    let mut entry_indent = None;

    for (index, line) in lines.iter().enumerate().take(end).skip(start) {
        let Some(caps) = ENTRY_PATTERN.captures(line) else {
            continue;
        };

        let indent = caps["indent"].to_string();
        entry_indent.get_or_insert_with(|| indent.clone());
        let raw_value = caps["value"].trim().to_string();
        let entry = MapEntry {
            index,
            indent,
            comment: caps.name("comment").map_or_else(String::new, |c| c.as_str().into()),
            value: Value::parse_literal(&raw_value),
            raw_value,
        };
        entries.insert(caps["key"].to_string(), entry);
    }

    let entry_indent = entry_indent.unwrap_or_else(|| format!("{map_indent}  "));
    (entries, entry_indent)
}

/// Merge new entries into the lines of a script.
///
/// Entries are visited in the given order. Existing keys whose value differs
/// are rewritten in place with their indentation and comment kept. New keys
/// are rendered at `entry_indent` and placed just before `closing`, in the
/// order they were given. Returns the number of changed entries and the new
/// lines.
pub fn apply_entries(
    lines: &[String],
    existing: &HashMap<String, MapEntry>,
    entries: &IndexMap<String, Value>,
    entry_indent: &str,
    closing: usize,
) -> (usize, Vec<String>) {
    let mut replaced: HashMap<usize, String> = HashMap::new();
    let mut inserted = Vec::new();

    for (key, value) in entries {
        match existing.get(key) {
            Some(entry) if entry.value.semantic_eq(value) => {
                debug!("keep {key:?}, value unchanged");
            }
            Some(entry) => {
                debug!("replace {key:?}: {} -> {value}", entry.raw_value);
                replaced.insert(entry.index, render_entry(key, value, &entry.indent, &entry.comment));
            }
            None => {
                debug!("insert {key:?}: {value}");
                inserted.push(render_entry(key, value, entry_indent, ""));
            }
        }
    }

    let updated = replaced.len() + inserted.len();
    let mut output = Vec::with_capacity(lines.len() + inserted.len());
    for (index, line) in lines.iter().enumerate() {
        if index == closing {
            output.append(&mut inserted);
        }
        output.push(replaced.remove(&index).unwrap_or_else(|| line.clone()));
    }
    output.append(&mut inserted);

    (updated, output)
}

/// Render a single map entry line.
pub fn render_entry(key: &str, value: &Value, indent: &str, comment: &str) -> String {
    format!("{indent}\"{key}\": {value},{comment}")
}

/// Update or append entries inside a named map of a Tengo script.
///
/// The script is only rewritten when the result differs from what is on disk.
///
/// # Errors
///
/// - Return [`Error::MissingScript`] if the script does not exist.
/// - Return [`Error::EmptyMapName`] if `map_name` is empty.
/// - Return [`Error::MapNotFound`] if the script has no such map.
/// - Return [`Error::UnclosedMap`] if the map is never closed.
/// - Return [`Error::ReadScript`] or [`Error::WriteScript`] on I/O failure.
#[instrument(skip(path, entries), level = "debug")]
pub fn update_tengo_map(
    path: impl AsRef<Path>,
    map_name: &str,
    entries: &IndexMap<String, Value>,
) -> Result<MapUpdate> {
    let path = path.as_ref();
    let text = read_to_string(path).map_err(|err| match err.kind() {
        IoErrorKind::NotFound => Error::MissingScript { script_path: path.into() },
        _ => Error::ReadScript { source: err, script_path: path.into() },
    })?;
    if map_name.is_empty() {
        return Err(Error::EmptyMapName);
    }

    // INVARIANT: Line endings are compared as LF, so CRLF scripts with no
    // changes are left untouched.
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = text.lines().map(str::to_owned).collect();
    let (start, map_indent) = find_map_header(&lines, map_name)?;
    let end = find_map_end(&lines, start)?;
    let (existing, entry_indent) = collect_entries(&lines, start + 1, end, &map_indent);
    let (updated, lines) = apply_entries(&lines, &existing, entries, &entry_indent, end);

    let new_text = format!("{}\n", lines.join("\n"));
    let wrote_file = new_text != text;
    if wrote_file {
        write(path, new_text).map_err(|err| Error::WriteScript {
            source: err,
            script_path: path.into(),
        })?;
        info!("updated {updated} entries of {map_name:?} in {}", path.display());
    } else {
        debug!("{} already up to date", path.display());
    }

    Ok(MapUpdate { updated, wrote_file })
}

/// Tengo map error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Tengo script does not exist.
    #[error("missing Tengo script {:?}", script_path.display())]
    MissingScript { script_path: PathBuf },

    /// Tengo script cannot be read from.
    #[error("failed to read Tengo script {:?}", script_path.display())]
    ReadScript {
        #[source]
        source: std::io::Error,
        script_path: PathBuf,
    },

    /// Tengo script cannot be written to.
    #[error("failed to write Tengo script {:?}", script_path.display())]
    WriteScript {
        #[source]
        source: std::io::Error,
        script_path: PathBuf,
    },

    /// No map name given.
    #[error("map name must be provided")]
    EmptyMapName,

    /// Destination has no path part.
    #[error("destination {dest:?} must name a Tengo script path")]
    EmptyDestination { dest: String },

    /// Script has no map with the given name.
    #[error("could not find map {map_name:?} in Tengo script")]
    MapNotFound { map_name: String },

    /// Map header is never matched by a closing brace.
    #[error("failed to locate closing brace for map opened on line {header_line}")]
    UnclosedMap { header_line: usize },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        use crate::error::ErrorKind;

        match self {
            Self::MissingScript { .. } | Self::MapNotFound { .. } => ErrorKind::NotFound,
            Self::EmptyMapName | Self::EmptyDestination { .. } => ErrorKind::InvalidArgument,
            Self::UnclosedMap { .. } => ErrorKind::MalformedInput,
            Self::ReadScript { .. } | Self::WriteScript { .. } => ErrorKind::Io,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
