/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::io;

/// Failed to read an input stream
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Debug)]
enum ErrorKind {
    PathNotSet,
    OffsetGreaterThanFileSize,
    TooManyParts(u32),
    Io(io::Error),
    Task(tokio::task::JoinError),
}

impl Error {
    pub(crate) fn path_not_set() -> Error {
        Self {
            kind: ErrorKind::PathNotSet,
        }
    }

    pub(crate) fn offset_greater_than_file_size() -> Error {
        Self {
            kind: ErrorKind::OffsetGreaterThanFileSize,
        }
    }

    pub(crate) fn too_many_parts(max_parts: u32) -> Error {
        Self {
            kind: ErrorKind::TooManyParts(max_parts),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::PathNotSet => f.write_str("a path is required to read a file"),
            ErrorKind::OffsetGreaterThanFileSize => write!(
                f,
                "offset must be less than or equal to file size but was greater than"
            ),
            ErrorKind::TooManyParts(max_parts) => write!(
                f,
                "input stream produced more than the maximum of {max_parts} parts"
            ),
            ErrorKind::Io(_) => f.write_str("I/O error"),
            ErrorKind::Task(_) => f.write_str("task failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err as _),
            ErrorKind::Task(err) => Some(err as _),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self {
            kind: ErrorKind::Task(value),
        }
    }
}
