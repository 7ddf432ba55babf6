/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The storage capability set used by [`Client`](crate::Client).
//!
//! The client never talks to a concrete store directly. Every object and multipart call goes
//! through [`StorageBackend`], which keeps the upload orchestration independent of the
//! store and lets tests substitute a fault-injecting backend.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Error;
use crate::types::{ObjectSummary, PartResult, MIN_MULTIPART_PART_SIZE_BYTES};

mod in_memory;
mod s3;

pub use in_memory::InMemoryBackend;
pub use s3::S3Backend;

/// A remote object store.
///
/// Implementations must be safe to call concurrently. The multipart upload orchestrator issues
/// `upload_part` calls for different parts of the same upload in parallel.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Start a multipart upload for `key` and return its upload ID.
    async fn create_multipart_upload(&self, key: &str) -> Result<String, Error>;

    /// Upload a single part and return the entity tag the store assigned to it.
    ///
    /// Uploading the same part number twice replaces the earlier part.
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, Error>;

    /// Commit a multipart upload from the given parts, which must be in ascending part
    /// number order. Returns the entity tag of the assembled object when the store reports one.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<Option<String>, Error>;

    /// Abort a multipart upload and discard every part uploaded for it.
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error>;

    /// Store an object in a single request.
    async fn put_object(&self, key: &str, body: Bytes) -> Result<Option<String>, Error>;

    /// Fetch the full contents of an object.
    ///
    /// Returns an error of kind [`NotFound`](crate::error::ErrorKind::NotFound) if the key
    /// does not exist.
    async fn get_object(&self, key: &str) -> Result<Bytes, Error>;

    /// List every object whose key starts with `prefix`.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error>;

    /// Delete an object.
    async fn delete_object(&self, key: &str) -> Result<(), Error>;

    /// Smallest size the store accepts for any part but the last one
    fn min_part_size(&self) -> u64 {
        MIN_MULTIPART_PART_SIZE_BYTES
    }
}

#[async_trait]
impl StorageBackend for Arc<dyn StorageBackend + '_> {
    async fn create_multipart_upload(&self, key: &str) -> Result<String, Error> {
        (**self).create_multipart_upload(key).await
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, Error> {
        (**self).upload_part(key, upload_id, part_number, body).await
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<Option<String>, Error> {
        (**self)
            .complete_multipart_upload(key, upload_id, parts)
            .await
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        (**self).abort_multipart_upload(key, upload_id).await
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<Option<String>, Error> {
        (**self).put_object(key, body).await
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        (**self).get_object(key).await
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        (**self).list_objects(prefix).await
    }

    async fn delete_object(&self, key: &str) -> Result<(), Error> {
        (**self).delete_object(key).await
    }

    fn min_part_size(&self) -> u64 {
        (**self).min_part_size()
    }
}
