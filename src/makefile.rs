// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Makefile recipe handling.
//!
//! Installed style packs are run through a `vale` target in the consumer's
//! Makefile. Stilyagi makes sure that target exists in its canonical form
//! without disturbing any other target or variable in the file.
//!
//! # Target Blocks
//!
//! A target block starts with a header line, e.g., `vale: deps ## help`,
//! continues through every following line indented with a tab, and ends after
//! any blank lines trailing the recipe. Replacing a target swaps out that
//! whole block at once.

use regex::Regex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_to_string, write},
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Variable holding the path to the Vale binary.
pub const VALE_VARIABLE: &str = "VALE";

/// Default assignment for [`VALE_VARIABLE`].
pub const VALE_ASSIGNMENT: &str = "VALE ?= vale";

/// Name of the managed target.
pub const VALE_TARGET: &str = "vale";

/// Canonical recipe of the managed target.
pub const VALE_RECIPE: [&str; 3] = [
    "vale: $(VALE) $(ACRONYM_SCRIPT) ## Check prose",
    "\t$(VALE) sync",
    "\t$(VALE) --no-global .",
];

const PHONY_MARKER: &str = ".PHONY";

/// Makefile editor.
///
/// # Invariant
///
/// - Every edit is idempotent.
/// - Lines the edit does not own are kept as they are.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MakefileEdit {
    lines: Vec<String>,
}

impl MakefileEdit {
    /// Construct new empty Makefile editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load Makefile for editing.
    ///
    /// A missing file yields an empty editor.
    ///
    /// # Errors
    ///
    /// - Return [`Error::ReadMakefile`] if the file exists but cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match read_to_string(path.as_ref()) {
            Ok(content) => Ok(Self::from(content)),
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                debug!("no Makefile at {}, starting empty", path.as_ref().display());
                Ok(Self::new())
            }
            Err(err) => Err(Error::ReadMakefile {
                source: err,
                makefile_path: path.as_ref().to_path_buf(),
            }),
        }
    }

    /// Write Makefile back to disk in one shot.
    ///
    /// # Errors
    ///
    /// - Return [`Error::WriteMakefile`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write(path.as_ref(), self.to_string()).map_err(|err| Error::WriteMakefile {
            source: err,
            makefile_path: path.as_ref().to_path_buf(),
        })
    }

    /// Current lines of the Makefile.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Make sure a variable is defined.
    ///
    /// Any of `KEY =`, `KEY ?=`, or `KEY :=` counts as a definition. If none is
    /// found, the assignment is prepended along with a blank separator line
    /// when the file is not empty.
    pub fn ensure_variable(&mut self, key: &str, assignment: &str) {
        // INVARIANT: The key is escaped, so the pattern always compiles.
        let pattern = Regex::new(&format!(r"^{}\s*[?:]?=", regex::escape(key)))
            .expect("escaped variable pattern is valid");

        if self.lines.iter().any(|line| pattern.is_match(line)) {
            return;
        }

        self.prepend(assignment);
    }

    /// Make sure a target is declared phony.
    ///
    /// Appends the target to the first `.PHONY` line, or prepends a new
    /// `.PHONY` line when there is none.
    pub fn ensure_phony(&mut self, target: &str) {
        let phony = self
            .lines
            .iter_mut()
            .find(|line| line.trim_start().starts_with(PHONY_MARKER));

        match phony {
            Some(line) if line.split_whitespace().any(|word| word == target) => {}
            Some(line) => *line = format!("{} {target}", line.trim_end()),
            None => self.prepend(&format!("{PHONY_MARKER}: {target}")),
        }
    }

    /// Replace a target block with a canonical recipe.
    ///
    /// The first line starting with `header` marks the block to replace. When
    /// no such line exists, the recipe is appended after a single blank
    /// separator line.
    pub fn replace_target(&mut self, header: &str, recipe: &[&str]) {
        let recipe = recipe.iter().map(ToString::to_string);
        let Some(start) = self.lines.iter().position(|line| line.starts_with(header)) else {
            if self.lines.last().is_some_and(|line| !line.trim().is_empty()) {
                self.lines.push(String::new());
            }
            self.lines.extend(recipe);
            return;
        };

        let mut end = start + 1;
        while end < self.lines.len() && self.lines[end].starts_with('\t') {
            end += 1;
        }
        while end < self.lines.len() && self.lines[end].trim().is_empty() {
            end += 1;
        }

        self.lines.splice(start..end, recipe);
    }

    fn prepend(&mut self, line: &str) {
        let mut head = vec![line.to_string()];
        if !self.lines.is_empty() {
            head.push(String::new());
        }
        self.lines.splice(0..0, head);
    }
}

impl Display for MakefileEdit {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "{}", self.lines.join("\n").trim_end())
    }
}

impl From<String> for MakefileEdit {
    fn from(content: String) -> Self {
        Self::from(content.as_str())
    }
}

impl From<&str> for MakefileEdit {
    fn from(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_owned).collect(),
        }
    }
}

/// Make sure the Makefile exposes the canonical `vale` target.
///
/// Defines the `VALE` variable if needed, declares `vale` phony, and swaps in
/// the canonical recipe. Idempotent under repeated invocation.
///
/// # Errors
///
/// - Return [`Error::ReadMakefile`] if an existing file cannot be read.
/// - Return [`Error::WriteMakefile`] if the file cannot be written.
#[instrument(skip(path), level = "debug")]
pub fn update_makefile(path: impl AsRef<Path>) -> Result<()> {
    let mut makefile = MakefileEdit::load(path.as_ref())?;
    makefile.ensure_variable(VALE_VARIABLE, VALE_ASSIGNMENT);
    makefile.ensure_phony(VALE_TARGET);
    makefile.replace_target(&format!("{VALE_TARGET}:"), &VALE_RECIPE);
    makefile.save(path.as_ref())?;
    info!("updated {}", path.as_ref().display());

    Ok(())
}

/// Makefile manipulation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Makefile cannot be read from.
    #[error("failed to read Makefile at {:?}", makefile_path.display())]
    ReadMakefile {
        #[source]
        source: std::io::Error,
        makefile_path: PathBuf,
    },

    /// Makefile cannot be written to.
    #[error("failed to write Makefile at {:?}", makefile_path.display())]
    WriteMakefile {
        #[source]
        source: std::io::Error,
        makefile_path: PathBuf,
    },
}

impl Error {
    /// Classify error.
    pub fn kind(&self) -> crate::error::ErrorKind {
        crate::error::ErrorKind::Io
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
