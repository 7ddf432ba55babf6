/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::cmp;
use std::time::Duration;

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

/// Lowest valid part number
pub const MIN_PART_NUMBER: u32 = 1;

/// Maximum number of parts that a single multipart upload supports
pub const MAX_PARTS: u32 = 10_000;

/// Minimum part size in bytes the backend accepts for every part except the last one.
///
/// This is the Amazon S3 limit and the default for [`StorageBackend::min_part_size`](crate::backend::StorageBackend::min_part_size).
pub const MIN_MULTIPART_PART_SIZE_BYTES: u64 = 5 * MEBIBYTE;

/// The target part size for an upload request.
#[derive(Debug, Clone, Default)]
pub enum PartSize {
    /// Automatically configure the part size.
    #[default]
    Auto,

    /// Target part size explicitly given.
    ///
    /// NOTE: This is a suggestion and will be used if possible but may be adjusted for an individual request
    /// as required by the backend (minimum part size, maximum number of parts).
    Target(u64),
}

/// The concurrency settings to use for a single upload request.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencyMode {
    /// Automatically configure the number of in-flight part uploads.
    #[default]
    Auto,

    /// Explicit number of in-flight part uploads.
    Explicit(usize),
}

/// Retry settings for individual `UploadPart` requests.
///
/// A failed part is retried up to `max_attempts - 1` times with exponential backoff before
/// the multipart upload is aborted. `CreateMultipartUpload`, `CompleteMultipartUpload` and
/// `AbortMultipartUpload` are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRetry {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl PartRetry {
    /// Create a new retry setting with the given number of total attempts per part (including
    /// the first one). Values below 1 are treated as 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: cmp::max(max_attempts, 1),
            ..Default::default()
        }
    }

    /// Never retry a failed part
    pub fn disabled() -> Self {
        Self::new(1)
    }

    /// Set the delay before the first retry. Each following retry doubles the delay.
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Set the upper bound on the delay between two attempts
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Total number of attempts per part, including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Upper bound on the delay between two attempts
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Delay to wait before retry number `retry` (1-indexed)
    pub(crate) fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        cmp::min(self.initial_backoff.saturating_mul(factor), self.max_backoff)
    }
}

impl Default for PartRetry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// One successfully uploaded part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub(crate) part_number: u32,
    pub(crate) e_tag: String,
}

impl PartResult {
    /// Create a new part result
    pub fn new(part_number: u32, e_tag: impl Into<String>) -> Self {
        Self {
            part_number,
            e_tag: e_tag.into(),
        }
    }

    /// The 1-based part number, assigned by position in the source
    pub fn part_number(&self) -> u32 {
        self.part_number
    }

    /// The entity tag the backend returned for this part
    pub fn e_tag(&self) -> &str {
        &self.e_tag
    }
}

/// Describes the result of aborting an in-progress upload.
#[derive(Debug, Default)]
pub struct AbortedUpload {
    pub(crate) upload_id: Option<String>,
}

impl AbortedUpload {
    /// Get the multipart upload ID that was cancelled
    ///
    /// Not present for uploads that did not utilize a multipart upload
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }
}

/// Summary of a stored object as returned by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub(crate) key: String,
    pub(crate) size: u64,
    pub(crate) e_tag: Option<String>,
}

impl ObjectSummary {
    /// Create a new object summary
    pub fn new(key: impl Into<String>, size: u64, e_tag: Option<String>) -> Self {
        Self {
            key: key.into(),
            size,
            e_tag,
        }
    }

    /// The object key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Size of the object in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The entity tag of the object, if the backend reported one
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }
}
