/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::env;

use aws_types::region::Region;
use aws_types::SdkConfig;

use crate::backend::S3Backend;
use crate::config::Builder;
use crate::error::{self, Error};
use crate::types::{ConcurrencyMode, PartRetry, PartSize};
use crate::Config;

/// Environment variable naming the bucket objects are stored in
pub const BUCKET_NAME_ENV_VAR: &str = "AWS_BUCKET_NAME";

/// Environment variable naming the region of the bucket
pub const REGION_ENV_VAR: &str = "AWS_REGION";

/// Region used when neither an explicit region nor `AWS_REGION` is set
pub const DEFAULT_REGION: &str = "us-east-1";

/// Load a [`Config`] backed by Amazon S3 from the environment.
///
/// The bucket is read from `AWS_BUCKET_NAME` and the region from `AWS_REGION` (defaulting to
/// `us-east-1`). Credentials and every other SDK setting come from the standard AWS shared
/// configuration chain.
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
    bucket: Option<String>,
    region: Option<String>,
    sdk_config: Option<SdkConfig>,
}

impl ConfigLoader {
    /// Use `bucket` instead of the value of `AWS_BUCKET_NAME`
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Use `region` instead of the value of `AWS_REGION`
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Use an already loaded SDK configuration instead of loading one from the environment.
    ///
    /// The region override and `AWS_REGION` are ignored when an SDK config is given.
    pub fn sdk_config(mut self, sdk_config: SdkConfig) -> Self {
        self.sdk_config = Some(sdk_config);
        self
    }

    /// Minimum object size that should trigger a multipart upload.
    ///
    /// Default is [PartSize::Auto]
    pub fn multipart_threshold(mut self, threshold: PartSize) -> Self {
        self.builder = self.builder.multipart_threshold(threshold);
        self
    }

    /// The target size of each part when using a multipart upload to complete the request.
    ///
    /// Default is [PartSize::Auto]
    pub fn part_size(mut self, part_size: PartSize) -> Self {
        self.builder = self.builder.part_size(part_size);
        self
    }

    /// Set the maximum number of part uploads in flight for a single upload.
    ///
    /// Default is [ConcurrencyMode::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.builder = self.builder.concurrency(concurrency);
        self
    }

    /// Set how failed part uploads are retried.
    pub fn part_retry(mut self, part_retry: PartRetry) -> Self {
        self.builder = self.builder.part_retry(part_retry);
        self
    }

    /// Load the default configuration
    ///
    /// If fields have been overridden during builder construction, the override values will be
    /// used. Otherwise, the default values for each field will be provided.
    pub async fn load(self) -> Result<Config, Error> {
        let bucket = self
            .bucket
            .or_else(|| env::var(BUCKET_NAME_ENV_VAR).ok())
            .unwrap_or_default();
        if bucket.is_empty() {
            return Err(error::invalid_input(format!(
                "no bucket configured, set {BUCKET_NAME_ENV_VAR}"
            )));
        }

        let sdk_config = match self.sdk_config {
            Some(sdk_config) => sdk_config,
            None => {
                let region = self
                    .region
                    .or_else(|| env::var(REGION_ENV_VAR).ok())
                    .filter(|region| !region.is_empty())
                    .unwrap_or_else(|| DEFAULT_REGION.to_owned());
                tracing::debug!(%bucket, %region, "loading AWS shared config");
                aws_config::from_env()
                    .region(Region::new(region))
                    .load()
                    .await
            }
        };

        let client = aws_sdk_s3::Client::new(&sdk_config);
        self.builder
            .backend(S3Backend::new(client, bucket))
            .build()
    }
}
