/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::error::{self, Error};
use crate::types::{ConcurrencyMode, PartRetry, PartSize};

/// Loading [`Config`] from the environment
pub mod loader;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    multipart_threshold: PartSize,
    part_size: PartSize,
    concurrency: ConcurrencyMode,
    part_retry: PartRetry,
    backend: Arc<dyn StorageBackend>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns a reference to the multipart upload threshold
    pub fn multipart_threshold(&self) -> &PartSize {
        &self.multipart_threshold
    }

    /// Returns a reference to the target part size to use for multipart uploads
    pub fn part_size(&self) -> &PartSize {
        &self.part_size
    }

    /// Returns the concurrency setting to use for individual uploads.
    pub fn concurrency(&self) -> &ConcurrencyMode {
        &self.concurrency
    }

    /// Returns the retry setting for individual part uploads
    pub fn part_retry(&self) -> &PartRetry {
        &self.part_retry
    }

    /// The storage backend requests are sent to
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    multipart_threshold: PartSize,
    part_size: PartSize,
    concurrency: ConcurrencyMode,
    part_retry: PartRetry,
    backend: Option<Arc<dyn StorageBackend>>,
}

impl Builder {
    /// Minimum object size that should trigger a multipart upload.
    ///
    /// Objects whose length is known and does not exceed the larger of this value and the
    /// part size are uploaded with a single request.
    ///
    /// Default is [PartSize::Auto], which uses the part size.
    pub fn multipart_threshold(mut self, threshold: PartSize) -> Self {
        self.multipart_threshold = threshold;
        self
    }

    /// The target size of each part when using a multipart upload to complete the request.
    ///
    /// NOTE: The actual part size used may be larger than the configured part size if the
    /// backend requires a larger minimum part size or if the current value would result in
    /// more than 10,000 parts for an upload request.
    ///
    /// Default is [PartSize::Auto] (8 MiB).
    pub fn part_size(mut self, part_size: PartSize) -> Self {
        self.part_size = part_size;
        self
    }

    /// Set the maximum number of part uploads in flight for a single upload.
    ///
    /// Default is [ConcurrencyMode::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set how failed part uploads are retried.
    pub fn part_retry(mut self, part_retry: PartRetry) -> Self {
        self.part_retry = part_retry;
        self
    }

    /// Set the storage backend to use.
    pub fn backend(self, backend: impl StorageBackend + 'static) -> Self {
        self.shared_backend(Arc::new(backend))
    }

    /// Set a storage backend that is shared with other owners.
    pub fn shared_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Result<Config, Error> {
        let backend = self
            .backend
            .ok_or_else(|| error::invalid_input("a storage backend must be configured"))?;

        if let ConcurrencyMode::Explicit(0) = self.concurrency {
            return Err(error::invalid_input("concurrency must be at least 1"));
        }
        for (name, setting) in [
            ("part size", &self.part_size),
            ("multipart threshold", &self.multipart_threshold),
        ] {
            if let PartSize::Target(0) = setting {
                return Err(error::invalid_input(format!("{name} must be greater than 0")));
            }
        }

        Ok(Config {
            multipart_threshold: self.multipart_threshold,
            part_size: self.part_size,
            concurrency: self.concurrency,
            part_retry: self.part_retry,
            backend,
        })
    }
}
