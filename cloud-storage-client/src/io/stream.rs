/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::path::Path;

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::io::error::Error;
use crate::io::path_body::{PathBody, PathBodyBuilder};
use crate::io::size_hint::SizeHint;

/// Source of binary data.
///
/// `InputStream` wraps a source of data for ease of use. The length of in-memory and file
/// sources is known up front; reader sources have an unknown length and are always uploaded
/// with a multipart upload.
#[derive(Debug)]
pub struct InputStream {
    pub(super) inner: RawInputStream,
}

impl InputStream {
    /// Create a new `InputStream` from a static byte slice
    pub fn from_static(bytes: &'static [u8]) -> Self {
        let inner = RawInputStream::Buf(bytes.into());
        Self { inner }
    }

    /// Return the bounds on the remaining length of the `InputStream`
    pub fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }

    /// Start building a file-backed `InputStream` that reads only part of a file.
    ///
    /// ```no_run
    /// use cloud_storage_client::io::InputStream;
    ///
    /// # fn example() -> Result<(), cloud_storage_client::io::error::Error> {
    /// // upload bytes 1024..5120 of the archive
    /// let stream = InputStream::read_from()
    ///     .path("/var/backups/archive.tar")
    ///     .offset(1024)
    ///     .length(4096)
    ///     .build()?;
    /// assert_eq!(Some(4096), stream.size_hint().exact_len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn read_from() -> PathBodyBuilder {
        PathBodyBuilder::new()
    }

    /// Create a new `InputStream` that reads data from a given `path`.
    ///
    /// ## Warning
    /// The contents of the file MUST not change while the upload is in progress. The length
    /// of the file is captured when the stream is created.
    pub fn from_path(path: impl AsRef<Path>) -> Result<InputStream, Error> {
        Self::read_from().path(path).build()
    }

    /// Create a new `InputStream` from an async reader of unknown length.
    ///
    /// Uploads from a reader always use a multipart upload since the total length is not
    /// known until the reader is exhausted.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self {
            inner: RawInputStream::Reader(BoxReader(Box::new(reader))),
        }
    }

    /// Read the entire stream into memory.
    pub(crate) async fn into_bytes(self) -> Result<Bytes, Error> {
        match self.inner {
            RawInputStream::Buf(bytes) => Ok(bytes),
            RawInputStream::Fs(path_body) => {
                let data = tokio::task::spawn_blocking(move || {
                    let mut dst = vec![0; path_body.length as usize];
                    file_util::read_file_chunk_sync(&mut dst, &path_body.path, path_body.offset)?;
                    Ok::<_, Error>(Bytes::from(dst))
                });
                data.await?
            }
            RawInputStream::Reader(mut reader) => {
                let mut dst = Vec::new();
                reader.0.read_to_end(&mut dst).await?;
                Ok(Bytes::from(dst))
            }
        }
    }
}

pub(super) enum RawInputStream {
    /// In-memory buffer to read from
    Buf(Bytes),
    /// File based input
    Fs(PathBody),
    /// Async reader of unknown length
    Reader(BoxReader),
}

pub(crate) struct BoxReader(pub(super) Box<dyn AsyncRead + Send + Sync + Unpin + 'static>);

impl fmt::Debug for BoxReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxReader(dyn AsyncRead)").finish()
    }
}

impl fmt::Debug for RawInputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawInputStream::Buf(bytes) => f.debug_tuple("Buf").field(&bytes.len()).finish(),
            RawInputStream::Fs(path_body) => f.debug_tuple("Fs").field(path_body).finish(),
            RawInputStream::Reader(reader) => f.debug_tuple("Reader").field(reader).finish(),
        }
    }
}

impl RawInputStream {
    pub(super) fn size_hint(&self) -> SizeHint {
        match self {
            RawInputStream::Buf(bytes) => SizeHint::exact(bytes.remaining() as u64),
            RawInputStream::Fs(path_body) => SizeHint::exact(path_body.length),
            RawInputStream::Reader(_) => SizeHint::unknown(),
        }
    }
}

impl Default for InputStream {
    fn default() -> Self {
        Self {
            inner: RawInputStream::Buf(Bytes::default()),
        }
    }
}

impl From<Bytes> for InputStream {
    fn from(value: Bytes) -> Self {
        Self {
            inner: RawInputStream::Buf(value),
        }
    }
}

impl From<Vec<u8>> for InputStream {
    fn from(value: Vec<u8>) -> Self {
        Self::from(Bytes::from(value))
    }
}

impl From<&'static [u8]> for InputStream {
    fn from(slice: &'static [u8]) -> InputStream {
        Self::from(Bytes::from_static(slice))
    }
}

impl From<&'static str> for InputStream {
    fn from(slice: &'static str) -> InputStream {
        Self::from(Bytes::from_static(slice.as_bytes()))
    }
}

pub(super) mod file_util {
    #[cfg(unix)]
    pub(crate) use unix::read_file_chunk_sync;
    #[cfg(windows)]
    pub(crate) use windows::read_file_chunk_sync;

    #[cfg(unix)]
    mod unix {
        use std::fs::File;
        use std::io;
        use std::os::unix::fs::FileExt;
        use std::path::Path;

        pub(crate) fn read_file_chunk_sync(
            dst: &mut [u8],
            path: impl AsRef<Path>,
            offset: u64,
        ) -> Result<(), io::Error> {
            let file = File::open(path)?;
            file.read_exact_at(dst, offset)
        }
    }

    #[cfg(windows)]
    mod windows {
        use std::fs::File;
        use std::io;
        use std::io::{Read, Seek, SeekFrom};
        use std::path::Path;

        pub(crate) fn read_file_chunk_sync(
            dst: &mut [u8],
            path: impl AsRef<Path>,
            offset: u64,
        ) -> Result<(), io::Error> {
            let mut file = File::open(path)?;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(dst)
        }
    }
}
