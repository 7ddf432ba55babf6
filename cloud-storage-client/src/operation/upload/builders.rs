/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::io::InputStream;

use super::{UploadHandle, UploadInputBuilder};

/// Fluent builder for constructing a single object upload transfer
#[derive(Debug)]
pub struct UploadFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: UploadInputBuilder,
}

impl UploadFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Initiate an upload transfer for a single object.
    ///
    /// The input is validated before anything is sent, an invalid key fails here without a
    /// task being spawned. The returned handle must be joined to observe the outcome.
    pub fn initiate(self) -> Result<UploadHandle, Error> {
        let input = self.inner.build()?;
        crate::operation::upload::Upload::orchestrate(self.handle, input)
    }

    /// Object key to store the upload under. This field is required.
    pub fn key(mut self, input: impl Into<String>) -> Self {
        self.inner = self.inner.key(input);
        self
    }

    /// Object key to store the upload under. This field is required.
    pub fn set_key(mut self, input: Option<String>) -> Self {
        self.inner = self.inner.set_key(input);
        self
    }

    /// Object key to store the upload under
    pub fn get_key(&self) -> &Option<String> {
        &self.inner.key
    }

    /// Object data. Defaults to an empty object.
    pub fn body(mut self, input: InputStream) -> Self {
        self.inner = self.inner.body(input);
        self
    }

    /// Part size for this upload, overriding the client's configured part size.
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.inner = self.inner.part_size(part_size);
        self
    }

    /// Part size for this upload
    pub fn get_part_size(&self) -> Option<u64> {
        self.inner.part_size
    }

    /// Cancel the upload and abort the multipart upload if it does not finish within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Timeout for this upload
    pub fn get_timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }
}

impl crate::operation::upload::input::UploadInputBuilder {
    /// Initiate an upload transfer for a single object with this input using the given client.
    pub fn initiate_with(self, client: &crate::Client) -> Result<UploadHandle, Error> {
        let mut fluent_builder = client.upload();
        fluent_builder.inner = self;
        fluent_builder.initiate()
    }
}
