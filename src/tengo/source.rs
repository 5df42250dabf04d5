// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Source entry ingestion.
//!
//! Curated allow lists are kept as plain line-oriented files. Each non-blank
//! line that is not a `#` comment holds one entry, optionally followed by an
//! inline `#` comment. How an entry becomes a key and value depends on the
//! selected [`MapValueType`].

use crate::value::{is_quoted, parse_bool, parse_number, unquote, Value};

use indexmap::IndexMap;
use regex::Regex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    sync::LazyLock,
};
use tracing::{debug, instrument};

static TRAILING_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    // INVARIANT: Pattern is a constant known to be valid.
    Regex::new(r"\s+(#.*)?$").expect("trailing comment pattern is valid")
});

/// Coercion applied to source entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MapValueType {
    /// Each line is a key mapped to `true`.
    #[default]
    True,

    /// Lines are `key=value` with string values, raw or JSON quoted.
    String,

    /// Lines are `key=true` or `key=false`.
    Boolean,

    /// Lines are `key=number`.
    Number,
}

impl MapValueType {
    /// Every mode in the order they are listed to users.
    pub const ALL: [MapValueType; 4] = [Self::True, Self::String, Self::Boolean, Self::Number];

    /// Token selecting this mode on the command line.
    pub fn token(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::String => "=",
            Self::Boolean => "=b",
            Self::Number => "=n",
        }
    }

    fn coerce(&self, raw: &str) -> Result<Value> {
        match self {
            Self::True => Ok(Value::Bool(true)),
            Self::String if is_quoted(raw) => Ok(Value::Str(unquote(raw))),
            Self::String => Ok(Value::Str(raw.to_string())),
            Self::Boolean => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| Error::InvalidBoolean { value: raw.into() }),
            Self::Number => parse_number(raw).ok_or_else(|| Error::InvalidNumber { value: raw.into() }),
        }
    }
}

impl Display for MapValueType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.token())
    }
}

impl FromStr for MapValueType {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.token() == token)
            .ok_or_else(|| Error::InvalidMode {
                token: token.into(),
                choices: Self::ALL.map(|mode| mode.token()).join(", "),
            })
    }
}

/// Parse a single entry token into a key and value.
///
/// # Errors
///
/// - Return [`Error::MissingSeparator`] if a typed mode token has no `=`.
/// - Return [`Error::EmptyKey`] if the key part is blank.
/// - Return [`Error::InvalidBoolean`] or [`Error::InvalidNumber`] if the value
///   cannot be coerced.
pub fn parse_token(token: &str, kind: MapValueType) -> Result<(String, Value)> {
    if kind == MapValueType::True {
        return Ok((token.to_string(), Value::Bool(true)));
    }

    let (key, raw_value) = token
        .split_once('=')
        .ok_or_else(|| Error::MissingSeparator { token: token.into() })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::EmptyKey { token: token.into() });
    }

    Ok((key.to_string(), kind.coerce(raw_value.trim())?))
}

/// Parse entries out of a source list.
///
/// Later duplicates of a key overwrite earlier ones. Returns the number of
/// entry lines seen alongside the deduplicated entries, so the count can be
/// larger than the map.
///
/// # Errors
///
/// - Return [`Error::MissingSource`] if the source file does not exist.
/// - Return [`Error::ReadSource`] if the source file cannot be read.
/// - Return any error of [`parse_token`] for malformed lines.
#[instrument(skip(path), level = "debug")]
pub fn parse_source_entries(
    path: impl AsRef<Path>,
    kind: MapValueType,
) -> Result<(usize, IndexMap<String, Value>)> {
    let path = path.as_ref();
    let content = read_to_string(path).map_err(|err| match err.kind() {
        IoErrorKind::NotFound => Error::MissingSource { source_path: path.into() },
        _ => Error::ReadSource { source: err, source_path: path.into() },
    })?;

    let mut provided = 0;
    let mut entries = IndexMap::new();
    for line in content.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let token = TRAILING_COMMENT.replace(line, "");
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        provided += 1;
        let (key, value) = parse_token(token, kind)?;
        entries.insert(key, value);
    }
    debug!("parsed {} unique entries from {provided} lines", entries.len());

    Ok((provided, entries))
}

/// Source entry error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source file does not exist.
    #[error("missing input file {:?}", source_path.display())]
    MissingSource { source_path: PathBuf },

    /// Source file cannot be read from.
    #[error("failed to read input file {:?}", source_path.display())]
    ReadSource {
        #[source]
        source: std::io::Error,
        source_path: PathBuf,
    },

    /// Unknown coercion mode token.
    #[error("invalid value type {token:?}, choose from {choices}")]
    InvalidMode { token: String, choices: String },

    /// Typed mode token without a separator.
    #[error("source line {token:?} must include '=' when using typed modes")]
    MissingSeparator { token: String },

    /// Blank key.
    #[error("source line {token:?} has an empty key")]
    EmptyKey { token: String },

    /// Value is neither true nor false.
    #[error("expected true or false, got {value:?}")]
    InvalidBoolean { value: String },

    /// Value is not numeric.
    #[error("could not parse numeric value {value:?}")]
    InvalidNumber { value: String },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        use crate::error::ErrorKind;

        match self {
            Self::MissingSource { .. } => ErrorKind::NotFound,
            Self::ReadSource { .. } => ErrorKind::Io,
            Self::InvalidMode { .. } => ErrorKind::InvalidArgument,
            Self::MissingSeparator { .. }
            | Self::EmptyKey { .. }
            | Self::InvalidBoolean { .. }
            | Self::InvalidNumber { .. } => ErrorKind::MalformedInput,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
