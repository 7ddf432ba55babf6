/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use crate::error::{self, Error};
use crate::io::InputStream;
use crate::validation::validate_key;

/// Input type for uploading a single object
#[non_exhaustive]
#[derive(Debug)]
pub struct UploadInput {
    /// Object key to store the upload under
    pub key: String,

    /// The source of the object data
    pub body: InputStream,

    /// Part size for this upload, overriding the client's configured part size
    pub part_size: Option<u64>,

    /// Upper bound on the time the whole upload may take before it is cancelled and the
    /// multipart upload (if any) is aborted
    pub timeout: Option<Duration>,
}

impl UploadInput {
    /// Creates a new builder-style object to manufacture [`UploadInput`](crate::operation::upload::UploadInput).
    pub fn builder() -> UploadInputBuilder {
        UploadInputBuilder::default()
    }

    /// Take the body, leaving an empty stream in its place.
    pub(crate) fn take_body(&mut self) -> InputStream {
        std::mem::take(&mut self.body)
    }

    /// Object key to store the upload under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Part size override for this upload
    pub fn part_size(&self) -> Option<u64> {
        self.part_size
    }

    /// Timeout for this upload
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A builder for [`UploadInput`](crate::operation::upload::UploadInput).
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct UploadInputBuilder {
    pub(crate) key: Option<String>,
    pub(crate) body: Option<InputStream>,
    pub(crate) part_size: Option<u64>,
    pub(crate) timeout: Option<Duration>,
}

impl UploadInputBuilder {
    /// Object key to store the upload under. This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.key = Some(input.into());
        self
    }

    /// Object key to store the upload under. This field is required.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.key = input;
        self
    }

    /// Object data. Defaults to an empty object.
    pub fn body(mut self, input: InputStream) -> Self {
        self.body = Some(input);
        self
    }

    /// Object data. Defaults to an empty object.
    pub fn set_body(mut self, input: Option<InputStream>) -> Self {
        self.body = input;
        self
    }

    /// Part size for this upload, overriding the client's configured part size.
    ///
    /// The part size actually used may be larger if the backend requires a larger minimum
    /// part size or the upload would otherwise need more than 10,000 parts.
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }

    /// Part size for this upload, overriding the client's configured part size.
    pub fn set_part_size(mut self, part_size: Option<u64>) -> Self {
        self.part_size = part_size;
        self
    }

    /// Cancel the upload if it does not finish within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cancel the upload if it does not finish within `timeout`.
    pub fn set_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Consumes the builder and constructs a [`UploadInput`](crate::operation::upload::UploadInput).
    ///
    /// Fails with [`InputInvalid`](crate::error::ErrorKind::InputInvalid) for a missing,
    /// empty or absolute key and for a zero part size.
    pub fn build(self) -> Result<UploadInput, Error> {
        let key = self.key.unwrap_or_default();
        validate_key(&key)?;
        if self.part_size == Some(0) {
            return Err(error::invalid_input("part size must be greater than 0"));
        }

        Ok(UploadInput {
            key,
            body: self.body.unwrap_or_default(),
            part_size: self.part_size,
            timeout: self.timeout,
        })
    }
}
