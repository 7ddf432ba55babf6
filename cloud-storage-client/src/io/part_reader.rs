/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::cmp;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;

use crate::io::error::Error;
use crate::io::path_body::PathBody;
use crate::io::stream::{file_util, BoxReader, RawInputStream};
use crate::io::InputStream;
use crate::types::{MAX_PARTS, MIN_MULTIPART_PART_SIZE_BYTES};

/// Builder for creating a `PartReader`
#[derive(Debug)]
pub(crate) struct Builder {
    stream: Option<RawInputStream>,
    part_size: usize,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            stream: None,
            part_size: MIN_MULTIPART_PART_SIZE_BYTES as usize,
        }
    }

    /// Set the input stream to read from.
    pub(crate) fn stream(mut self, stream: InputStream) -> Self {
        self.stream = Some(stream.inner);
        self
    }

    /// Set the target part size that should be used when reading data.
    ///
    /// All parts except for possibly the last one will be of this size.
    pub(crate) fn part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size;
        self
    }

    pub(crate) fn build(self) -> PartReader {
        let stream = self.stream.unwrap_or(RawInputStream::Buf(Bytes::new()));
        PartReader::new(stream, self.part_size)
    }
}

/// Splits an input stream into consecutive, non-overlapping parts.
///
/// Part numbers are assigned 1..N in source order when the part is read, independent of
/// when (or in which order) the part is later uploaded.
#[derive(Debug)]
pub(crate) struct PartReader {
    inner: Inner,
    state: PartReaderState,
    part_size: usize,
}

#[derive(Debug)]
enum Inner {
    Bytes(Bytes),
    Fs(PathBody),
    Reader(BoxReader),
}

/// Contents of a single part of a multipart upload.
#[derive(Debug, Clone)]
pub(crate) struct PartData {
    // 1-indexed
    pub(crate) part_number: u32,
    pub(crate) data: Bytes,
}

impl PartData {
    pub(crate) fn new(part_number: u32, data: impl Into<Bytes>) -> Self {
        Self {
            part_number,
            data: data.into(),
        }
    }
}

#[derive(Debug)]
struct PartReaderState {
    // current start offset
    offset: u64,
    // next part number to hand out
    part_number: u32,
    // total number of bytes remaining to be read, `None` when unknown
    remaining: Option<u64>,
    eof: bool,
}

impl PartReader {
    fn new(raw: RawInputStream, part_size: usize) -> Self {
        let part_size = cmp::max(part_size, 1);
        let (inner, offset, remaining) = match raw {
            RawInputStream::Buf(buf) => {
                let len = buf.len() as u64;
                (Inner::Bytes(buf), 0, Some(len))
            }
            RawInputStream::Fs(path_body) => {
                let (offset, len) = (path_body.offset, path_body.length);
                (Inner::Fs(path_body), offset, Some(len))
            }
            RawInputStream::Reader(reader) => (Inner::Reader(reader), 0, None),
        };

        Self {
            inner,
            state: PartReaderState {
                offset,
                part_number: 1,
                remaining,
                eof: false,
            },
            part_size,
        }
    }

    /// Read the next part, or `None` once the source is exhausted.
    ///
    /// A source that is empty from the start still yields a single empty part 1 so that a
    /// multipart upload always has at least one part to complete with.
    pub(crate) async fn next_part(&mut self) -> Result<Option<PartData>, Error> {
        if self.state.eof {
            return Ok(None);
        }
        let part_number = self.state.part_number;
        if part_number > MAX_PARTS {
            return Err(Error::too_many_parts(MAX_PARTS));
        }

        let data = match &mut self.inner {
            Inner::Bytes(buf) => {
                let start = (self.state.offset) as usize;
                let end = cmp::min(start + self.part_size, buf.len());
                buf.slice(start..end)
            }
            Inner::Fs(path_body) => {
                let remaining = self.state.remaining.unwrap_or_default();
                let len = cmp::min(self.part_size as u64, remaining);
                let path = path_body.path.clone();
                let offset = self.state.offset;
                let handle = tokio::task::spawn_blocking(move || {
                    let mut dst = vec![0; len as usize];
                    file_util::read_file_chunk_sync(&mut dst, path, offset)?;
                    Ok::<_, Error>(Bytes::from(dst))
                });
                handle.await??
            }
            Inner::Reader(reader) => read_full(reader, self.part_size).await?,
        };

        let len = data.len() as u64;
        self.state.offset += len;
        self.state.remaining = self.state.remaining.map(|r| r - len);
        self.state.eof = match self.state.remaining {
            Some(remaining) => remaining == 0,
            None => (data.len()) < self.part_size,
        };

        if data.is_empty() && part_number > 1 {
            return Ok(None);
        }

        self.state.part_number += 1;
        Ok(Some(PartData::new(part_number, data)))
    }
}

/// Read from `reader` until `part_size` bytes are buffered or the reader reaches EOF
async fn read_full(reader: &mut BoxReader, part_size: usize) -> Result<Bytes, Error> {
    let mut dst = BytesMut::with_capacity(part_size);
    while dst.len() < part_size {
        let mut limited = (&mut reader.0).take((part_size - dst.len()) as u64);
        let n = limited.read_buf(&mut dst).await?;
        if n == 0 {
            break;
        }
    }
    Ok(dst.freeze())
}
