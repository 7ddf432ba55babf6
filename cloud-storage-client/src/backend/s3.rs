/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
};
use bytes::Bytes;
use tracing::Instrument;

use crate::backend::StorageBackend;
use crate::error::{self, Error};
use crate::types::{ObjectSummary, PartResult, MIN_MULTIPART_PART_SIZE_BYTES};

/// Region that must not be sent as a `LocationConstraint` when creating a bucket
const DEFAULT_REGION: &str = "us-east-1";

/// [`StorageBackend`] for a single Amazon S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
    bucket: String,
    min_part_size: u64,
}

impl S3Backend {
    /// Create a backend that stores objects in `bucket` using the given S3 client.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            min_part_size: MIN_MULTIPART_PART_SIZE_BYTES,
        }
    }

    /// Override the minimum part size, for S3 compatible stores with a different limit.
    pub fn with_min_part_size(mut self, min_part_size: u64) -> Self {
        self.min_part_size = min_part_size;
        self
    }

    /// The underlying S3 client
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    /// The bucket this backend operates on
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the bucket in `region`.
    ///
    /// A `LocationConstraint` is sent for every region other than `us-east-1`, which S3
    /// rejects as an explicit constraint.
    pub async fn create_bucket(&self, region: &str) -> Result<(), Error> {
        let mut req = self.client.create_bucket().bucket(&self.bucket);
        if region != DEFAULT_REGION {
            let location = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build();
            req = req.create_bucket_configuration(location);
        }

        req.send()
            .instrument(tracing::debug_span!("send-create-bucket", bucket = %self.bucket))
            .await?;
        Ok(())
    }

    /// Delete the bucket. S3 only deletes empty buckets.
    pub async fn delete_bucket(&self) -> Result<(), Error> {
        self.client
            .delete_bucket()
            .bucket(&self.bucket)
            .send()
            .instrument(tracing::debug_span!("send-delete-bucket", bucket = %self.bucket))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn create_multipart_upload(&self, key: &str) -> Result<String, Error> {
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-create-multipart-upload"))
            .await?;

        resp.upload_id.ok_or_else(|| {
            error::backend("CreateMultipartUpload response did not contain an upload ID")
        })
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, Error> {
        let content_length = body.len() as i64;
        let resp = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number as i32)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .instrument(tracing::debug_span!("send-upload-part", part_number))
            .await?;

        resp.e_tag.ok_or_else(|| {
            error::backend(format!(
                "UploadPart response for part {part_number} did not contain an ETag"
            ))
        })
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<Option<String>, Error> {
        let parts = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.part_number() as i32)
                    .e_tag(part.e_tag())
                    .build()
            })
            .collect::<Vec<_>>();

        let resp = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .instrument(tracing::debug_span!("send-complete-multipart-upload"))
            .await?;

        Ok(resp.e_tag)
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .instrument(tracing::debug_span!("send-abort-multipart-upload"))
            .await?;
        Ok(())
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<Option<String>, Error> {
        let content_length = body.len() as i64;
        let resp = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .instrument(tracing::debug_span!("send-put-object"))
            .await?;

        Ok(resp.e_tag)
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-get-object"))
            .await
            .map_err(|err| {
                let no_such_key = err
                    .as_service_error()
                    .map(GetObjectError::is_no_such_key)
                    .unwrap_or_default();
                if no_such_key {
                    error::not_found(err)
                } else {
                    Error::from(err)
                }
            })?;

        let data = resp.body.collect().await?;
        Ok(data.into_bytes())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        let prefix = (!prefix.is_empty()).then(|| prefix.to_owned());
        let mut summaries = Vec::new();
        let mut continuation_token = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(prefix.clone())
                .set_continuation_token(continuation_token.take())
                .send()
                .instrument(tracing::debug_span!("send-list-objects-v2"))
                .await?;

            summaries.extend(resp.contents().iter().filter_map(|object| {
                let key = object.key()?;
                let size = object.size().unwrap_or_default().max(0) as u64;
                Some(ObjectSummary::new(
                    key,
                    size,
                    object.e_tag().map(str::to_owned),
                ))
            }));

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or_default() => {
                    continuation_token = Some(token.to_owned());
                }
                _ => break,
            }
        }

        tracing::trace!("listed {} objects", summaries.len());
        Ok(summaries)
    }

    async fn delete_object(&self, key: &str) -> Result<(), Error> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .instrument(tracing::debug_span!("send-delete-object"))
            .await?;
        Ok(())
    }

    fn min_part_size(&self) -> u64 {
        self.min_part_size
    }
}
