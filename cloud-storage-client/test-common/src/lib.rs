/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Helpers shared by the integration tests.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cloud_storage_client::backend::{InMemoryBackend, StorageBackend};
use cloud_storage_client::error::{Error, ErrorKind};
use cloud_storage_client::types::{ConcurrencyMode, ObjectSummary, PartResult, PartRetry, PartSize};
use cloud_storage_client::{Client, Config};
use tempfile::NamedTempFile;

/// A backend call as observed by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateMultipartUpload { key: String },
    UploadPart { upload_id: String, part_number: u32 },
    CompleteMultipartUpload { upload_id: String, parts: Vec<PartResult> },
    AbortMultipartUpload { upload_id: String },
    PutObject { key: String },
    GetObject { key: String },
    ListObjects { prefix: String },
    DeleteObject { key: String },
}

/// An [`InMemoryBackend`] that records every call made to it and can be told to fail or
/// stall specific calls.
#[derive(Debug)]
pub struct RecordingBackend {
    inner: InMemoryBackend,
    calls: Mutex<Vec<Call>>,
    // part# -> number of attempts still to fail
    part_failures: Mutex<HashMap<u32, u32>>,
    part_delays: Mutex<HashMap<u32, Duration>>,
    fail_create: AtomicBool,
    fail_complete: AtomicBool,
    fail_abort: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingBackend {
    /// Wrap an in-memory backend that accepts parts as small as `min_part_size`
    pub fn new(min_part_size: u64) -> Self {
        Self {
            inner: InMemoryBackend::with_min_part_size(min_part_size),
            calls: Mutex::new(Vec::new()),
            part_failures: Mutex::new(HashMap::new()),
            part_delays: Mutex::new(HashMap::new()),
            fail_create: AtomicBool::new(false),
            fail_complete: AtomicBool::new(false),
            fail_abort: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fail the next `times` attempts to upload `part_number` with a retryable error
    pub fn fail_part(self, part_number: u32, times: u32) -> Self {
        self.part_failures
            .lock()
            .unwrap()
            .insert(part_number, times);
        self
    }

    /// Delay every upload of `part_number` by `delay`
    pub fn delay_part(self, part_number: u32, delay: Duration) -> Self {
        self.part_delays.lock().unwrap().insert(part_number, delay);
        self
    }

    pub fn fail_create(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_complete(self) -> Self {
        self.fail_complete.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_abort(self) -> Self {
        self.fail_abort.store(true, Ordering::SeqCst);
        self
    }

    /// The wrapped store
    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }

    /// Every call made so far, in the order the calls were made
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    /// The highest number of part uploads that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn should_fail_part(&self, part_number: u32) -> bool {
        let mut failures = self.part_failures.lock().unwrap();
        match failures.get_mut(&part_number) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

fn injected(what: &str) -> Error {
    Error::new(ErrorKind::BackendError, format!("injected {what} failure"))
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn create_multipart_upload(&self, key: &str) -> Result<String, Error> {
        self.record(Call::CreateMultipartUpload {
            key: key.to_owned(),
        });
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(injected("create"));
        }
        self.inner.create_multipart_upload(key).await
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, Error> {
        self.record(Call::UploadPart {
            upload_id: upload_id.to_owned(),
            part_number,
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.part_delays.lock().unwrap().get(&part_number).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.should_fail_part(part_number) {
            Err(injected("upload part"))
        } else {
            self.inner
                .upload_part(key, upload_id, part_number, body)
                .await
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> Result<Option<String>, Error> {
        self.record(Call::CompleteMultipartUpload {
            upload_id: upload_id.to_owned(),
            parts: parts.to_vec(),
        });
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(injected("complete"));
        }
        self.inner
            .complete_multipart_upload(key, upload_id, parts)
            .await
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), Error> {
        self.record(Call::AbortMultipartUpload {
            upload_id: upload_id.to_owned(),
        });
        if self.fail_abort.load(Ordering::SeqCst) {
            return Err(injected("abort"));
        }
        self.inner.abort_multipart_upload(key, upload_id).await
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<Option<String>, Error> {
        self.record(Call::PutObject {
            key: key.to_owned(),
        });
        self.inner.put_object(key, body).await
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, Error> {
        self.record(Call::GetObject {
            key: key.to_owned(),
        });
        self.inner.get_object(key).await
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        self.record(Call::ListObjects {
            prefix: prefix.to_owned(),
        });
        self.inner.list_objects(prefix).await
    }

    async fn delete_object(&self, key: &str) -> Result<(), Error> {
        self.record(Call::DeleteObject {
            key: key.to_owned(),
        });
        self.inner.delete_object(key).await
    }

    fn min_part_size(&self) -> u64 {
        self.inner.min_part_size()
    }
}

/// Create a client over `backend` with a fixed part size. The multipart threshold is left
/// at its default, so anything larger than one part goes through a multipart upload.
pub fn test_client(
    backend: Arc<RecordingBackend>,
    part_size: u64,
    concurrency: usize,
    part_retry: PartRetry,
) -> Client {
    let config = Config::builder()
        .part_size(PartSize::Target(part_size))
        .concurrency(ConcurrencyMode::Explicit(concurrency))
        .part_retry(part_retry)
        .shared_backend(backend)
        .build()
        .unwrap();
    Client::new(config)
}

/// Write `contents` to a new temporary file
pub fn create_test_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}
