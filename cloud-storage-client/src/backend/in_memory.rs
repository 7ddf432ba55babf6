/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::RwLock;

use crate::backend::StorageBackend;
use crate::error::{self, Error};
use crate::types::{ObjectSummary, PartResult, MIN_MULTIPART_PART_SIZE_BYTES};

/// A [`StorageBackend`] that keeps all objects and open multipart uploads in memory.
///
/// Useful for local development and tests. Entity tags are the quoted hex MD5 digest of the
/// stored bytes, the same format S3 uses for objects uploaded in a single request.
#[derive(Debug)]
pub struct InMemoryBackend {
    // key -> content
    objects: RwLock<BTreeMap<String, Bytes>>,
    // upload-id -> open upload
    uploads: RwLock<HashMap<String, OpenUpload>>,
    next_upload_id: AtomicU64,
    min_part_size: u64,
}

#[derive(Debug)]
struct OpenUpload {
    key: String,
    // part# -> (etag, content)
    parts: HashMap<u32, (String, Bytes)>,
}

impl InMemoryBackend {
    /// Create an empty backend with the default minimum part size of 5 MiB.
    pub fn new() -> Self {
        Self::with_min_part_size(MIN_MULTIPART_PART_SIZE_BYTES)
    }

    /// Create an empty backend that accepts parts down to `min_part_size` bytes.
    pub fn with_min_part_size(min_part_size: u64) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            uploads: RwLock::new(HashMap::new()),
            next_upload_id: AtomicU64::new(1),
            min_part_size,
        }
    }

    /// Number of multipart uploads that were created but neither completed nor aborted
    pub async fn open_uploads(&self) -> usize {
        self.uploads.read().await.len()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn e_tag(data: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(data))
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn create_multipart_upload(&self, key: &str) -> Result<String, Error> {
        let upload_id = format!(
            "upload-{}",
            self.next_upload_id.fetch_add(1, Ordering::Relaxed)
        );
        let mut uploads = self.uploads.write().await;
        uploads.insert(
            upload_id.clone(),
            OpenUpload {
                key: key.to_owned(),
                parts: HashMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, Error> {
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| error::not_found(format!("no such upload `{upload_id}`")))?;

        let e_tag = e_tag(&body);
        upload.parts.insert(part_number, (e_tag.clone(), body));
        Ok(e_tag)
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<Option<String>, Error> {
        if parts.is_empty() {
            return Err(error::invalid_input(
                "a multipart upload must be completed with at least one part",
            ));
        }
        if parts
            .windows(2)
            .any(|w| w[0].part_number() >= w[1].part_number())
        {
            return Err(error::invalid_input(
                "parts must be listed in ascending part number order",
            ));
        }

        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| error::not_found(format!("no such upload `{upload_id}`")))?;

        let mut combined = BytesMut::new();
        let last = parts.len() - 1;
        for (idx, part) in parts.iter().enumerate() {
            let (stored_e_tag, data) = upload.parts.get(&part.part_number()).ok_or_else(|| {
                error::invalid_input(format!("part {} was never uploaded", part.part_number()))
            })?;
            if stored_e_tag != part.e_tag() {
                return Err(error::invalid_input(format!(
                    "ETag mismatch for part {}",
                    part.part_number()
                )));
            }
            if idx != last && (data.len() as u64) < self.min_part_size {
                return Err(error::invalid_input(format!(
                    "part {} is smaller than the minimum part size of {} bytes",
                    part.part_number(),
                    self.min_part_size
                )));
            }
            combined.extend_from_slice(data);
        }

        uploads.remove(upload_id);
        drop(uploads);

        let data = combined.freeze();
        let e_tag = format!(
            "\"{:x}-{}\"",
            md5::compute(&data),
            parts.len()
        );
        self.objects.write().await.insert(key.to_owned(), data);
        Ok(Some(e_tag))
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        let mut uploads = self.uploads.write().await;
        match uploads.get(upload_id) {
            Some(upload) if upload.key == key => {
                uploads.remove(upload_id);
                Ok(())
            }
            _ => Err(error::not_found(format!("no such upload `{upload_id}`"))),
        }
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<Option<String>, Error> {
        let e_tag = e_tag(&body);
        self.objects.write().await.insert(key.to_owned(), body);
        Ok(Some(e_tag))
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| error::not_found(format!("no such key `{key}`")))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        let objects = self.objects.read().await;
        let summaries = objects
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| ObjectSummary::new(key, data.len() as u64, Some(e_tag(data))))
            .collect();
        Ok(summaries)
    }

    async fn delete_object(&self, key: &str) -> Result<(), Error> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn min_part_size(&self) -> u64 {
        self.min_part_size
    }
}
