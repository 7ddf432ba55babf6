/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::cmp;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::backend::StorageBackend;
use crate::error::Error;
use crate::io::InputStream;
use crate::operation::upload::builders::UploadFluentBuilder;
use crate::operation::upload::UploadOutput;
use crate::types::{ConcurrencyMode, ObjectSummary, PartResult, PartRetry, PartSize, MEBIBYTE};
use crate::{Config, DEFAULT_CONCURRENCY};

/// Object storage client.
///
/// Cloning a `Client` is cheap, all clones share the same configuration and backend.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, backend
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: crate::Config,
}

impl Handle {
    /// Get the concrete number of in-flight part uploads based on the concurrency setting.
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencyMode::Explicit(concurrency) => *concurrency,
            ConcurrencyMode::Auto => DEFAULT_CONCURRENCY,
        }
    }

    /// Get the concrete target part size to use for uploads
    pub(crate) fn upload_part_size_bytes(&self) -> u64 {
        match self.config.part_size() {
            PartSize::Auto => 8 * MEBIBYTE,
            PartSize::Target(explicit) => *explicit,
        }
    }

    /// Get the concrete size in bytes at or below which an upload of known length is sent as a
    /// single request.
    ///
    /// Never smaller than `part_size`, an object that fits in one part is never split.
    pub(crate) fn mpu_threshold_bytes(&self, part_size: u64) -> u64 {
        match self.config.multipart_threshold() {
            PartSize::Auto => part_size,
            PartSize::Target(explicit) => cmp::max(*explicit, part_size),
        }
    }

    pub(crate) fn part_retry(&self) -> &PartRetry {
        self.config.part_retry()
    }

    pub(crate) fn backend(&self) -> &Arc<dyn StorageBackend> {
        self.config.backend()
    }
}

impl Client {
    /// Creates a new client from a config.
    pub fn new(config: Config) -> Client {
        let handle = Arc::new(Handle { config });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Upload a single object.
    ///
    /// Constructs a fluent builder for the
    /// [`Upload`](crate::operation::upload::builders::UploadFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    /// use std::path::Path;
    /// use cloud_storage_client::io::InputStream;
    ///
    /// async fn upload_file(
    ///     client: &cloud_storage_client::Client,
    ///     path: impl AsRef<Path>
    /// ) -> Result<(), Box<dyn Error>> {
    ///     let stream = InputStream::from_path(path)?;
    ///     let handle = client.upload()
    ///         .key("my-key")
    ///         .body(stream)
    ///         .initiate()?;
    ///
    ///     // initiate() will return before the transfer is complete.
    ///     // Call the `join()` method on the returned handle to drive the transfer to completion.
    ///     // The handle can also be used to cancel the transfer.
    ///     let response = handle.join().await?;
    ///     // ... do something with response
    ///     Ok(())
    /// }
    ///
    /// ```
    pub fn upload(&self) -> UploadFluentBuilder {
        UploadFluentBuilder::new(self.handle.clone())
    }

    /// Upload the file at `path` to `key` and wait for the upload to finish.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: impl Into<String>,
    ) -> Result<UploadOutput, Error> {
        let stream = InputStream::from_path(path)?;
        self.upload().key(key).body(stream).initiate()?.join().await
    }

    /// Download the full contents of the object at `key`.
    pub async fn download(&self, key: &str) -> Result<Bytes, Error> {
        crate::operation::download::download(&self.handle, key).await
    }

    /// Download the object at `key` into a local file, creating or truncating it.
    pub async fn download_to_path(&self, key: &str, path: impl AsRef<Path>) -> Result<(), Error> {
        crate::operation::download::download_to_path(&self.handle, key, path.as_ref()).await
    }

    /// List the objects whose keys start with `prefix`. An empty prefix lists every object.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        crate::operation::list_objects::list_objects(&self.handle, prefix).await
    }

    /// List the keys of the objects whose keys start with `prefix`.
    pub async fn list_files(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let objects = self.list_objects(prefix).await?;
        Ok(objects.into_iter().map(|object| object.key).collect())
    }

    /// Delete the object at `key`.
    pub async fn delete_object(&self, key: &str) -> Result<(), Error> {
        crate::operation::delete_object::delete_object(&self.handle, key).await
    }

    /// Start a multipart upload for `key` and return its upload ID.
    ///
    /// Most callers should use [`upload`](Self::upload), which drives the whole multipart
    /// upload lifecycle. These primitives are for callers managing parts themselves.
    pub async fn create_multipart_upload(&self, key: &str) -> Result<String, Error> {
        crate::operation::multipart::create_multipart_upload(&self.handle, key).await
    }

    /// Upload one part of a multipart upload. `part_number` must be in `1..=10000`.
    pub async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<PartResult, Error> {
        crate::operation::multipart::upload_part(&self.handle, key, upload_id, part_number, body)
            .await
    }

    /// Complete a multipart upload. Parts are sent in ascending part number order regardless
    /// of the order given.
    pub async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<PartResult>,
    ) -> Result<Option<String>, Error> {
        crate::operation::multipart::complete_multipart_upload(&self.handle, key, upload_id, parts)
            .await
    }

    /// Abort a multipart upload.
    pub async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        crate::operation::multipart::abort_multipart_upload(&self.handle, key, upload_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::InMemoryBackend;
    use crate::types::{ConcurrencyMode, PartSize, MEBIBYTE};
    use crate::{Client, Config};

    fn client(threshold: PartSize, part_size: PartSize) -> Client {
        let config = Config::builder()
            .backend(InMemoryBackend::new())
            .multipart_threshold(threshold)
            .part_size(part_size)
            .build()
            .unwrap();
        Client::new(config)
    }

    #[test]
    fn test_defaults() {
        let handle = client(PartSize::Auto, PartSize::Auto).handle;
        assert_eq!(8 * MEBIBYTE, handle.upload_part_size_bytes());
        assert_eq!(
            8 * MEBIBYTE,
            handle.mpu_threshold_bytes(handle.upload_part_size_bytes())
        );
        assert_eq!(crate::DEFAULT_CONCURRENCY, handle.num_workers());
    }

    #[test]
    fn test_threshold_never_below_part_size() {
        let small = client(PartSize::Target(10), PartSize::Target(30));
        assert_eq!(30, small.handle.mpu_threshold_bytes(30));
        assert_eq!(12, small.handle.mpu_threshold_bytes(12));

        let large = client(PartSize::Target(100), PartSize::Target(30));
        assert_eq!(100, large.handle.mpu_threshold_bytes(30));
    }

    #[test]
    fn test_explicit_concurrency() {
        let config = Config::builder()
            .backend(InMemoryBackend::new())
            .concurrency(ConcurrencyMode::Explicit(3))
            .build()
            .unwrap();
        assert_eq!(3, Client::new(config).handle.num_workers());
    }
}
