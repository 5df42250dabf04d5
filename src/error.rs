// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shared error taxonomy.
//!
//! Each module defines its own error type, but every one of them can be
//! classified into one of the broad categories below. Callers that only care
//! about the category of a failure, e.g., to decide on an exit code, can use
//! the `kind` method every module error provides.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required file, map, or style is missing.
    NotFound,

    /// Caller supplied an argument that violates a constraint.
    InvalidArgument,

    /// Input could be read, but its contents are unusable.
    MalformedInput,

    /// Network or HTTP failure while talking to a remote service.
    TransientExternal,

    /// Local file system operation failed.
    Io,
}

impl Display for ErrorKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::NotFound => "not found",
            Self::InvalidArgument => "invalid argument",
            Self::MalformedInput => "malformed input",
            Self::TransientExternal => "external failure",
            Self::Io => "i/o failure",
        };

        fmt.write_str(name)
    }
}
