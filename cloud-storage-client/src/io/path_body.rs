/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fs;
use std::path::{Path, PathBuf};

use crate::io::error::Error;
use crate::io::stream::RawInputStream;
use crate::io::InputStream;

/// A file (or a byte range of a file) used as an upload source
#[derive(Debug)]
pub(super) struct PathBody {
    pub(super) path: PathBuf,
    pub(super) length: u64,
    pub(super) offset: u64,
}

/// Builder for creating an [`InputStream`] from a file.
#[derive(Debug, Default)]
pub struct PathBodyBuilder {
    path: Option<PathBuf>,
    length: Option<u64>,
    offset: Option<u64>,
}

impl PathBodyBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the path to read from.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Specify the length to read (in bytes).
    ///
    /// By pre-specifying the length, this API skips an additional call to retrieve the size
    /// from file-system metadata.
    pub fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    /// Specify the offset to start reading from (in bytes).
    ///
    /// When used in conjunction with `length`, allows for reading a single "chunk" of a file.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns an [`InputStream`] from this builder.
    pub fn build(self) -> Result<InputStream, Error> {
        let path = self.path.ok_or_else(Error::path_not_set)?;
        let offset = self.offset.unwrap_or_default();

        let length = match self.length {
            Some(length) => length,
            None => {
                let metadata = fs::metadata(&path)?;
                let file_size = metadata.len();

                if offset > file_size {
                    return Err(Error::offset_greater_than_file_size());
                }

                file_size - offset
            }
        };

        let body = PathBody {
            path,
            length,
            offset,
        };

        Ok(InputStream {
            inner: RawInputStream::Fs(body),
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::io::InputStream;

    #[test]
    fn test_from_path_uses_file_length() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();

        let stream = InputStream::from_path(tmp.path()).unwrap();
        assert_eq!(Some(11), stream.size_hint().exact_len());

        let stream = InputStream::read_from()
            .path(tmp.path())
            .offset(6)
            .build()
            .unwrap();
        assert_eq!(Some(5), stream.size_hint().exact_len());
    }

    #[test]
    fn test_offset_past_end_rejected() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"abc").unwrap();

        let result = InputStream::read_from().path(tmp.path()).offset(4).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(InputStream::from_path("/definitely/not/a/real/file").is_err());
    }
}
