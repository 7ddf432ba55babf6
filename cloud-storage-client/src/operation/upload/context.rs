/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::{Arc, OnceLock};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{self, Error};
use crate::operation::upload::UploadInput;

/// Internal context used to drive a single Upload operation
#[derive(Debug, Clone)]
pub(crate) struct UploadContext {
    /// reference to client handle used to do actual work
    pub(crate) handle: Arc<crate::client::Handle>,
    /// the request (NOTE: the body will have been taken for processing, only the other fields remain)
    pub(crate) request: Arc<UploadInput>,
    /// the multipart upload ID, set once `CreateMultipartUpload` succeeds
    upload_id: Arc<OnceLock<String>>,
    /// cancelled by `UploadHandle::abort`
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl UploadContext {
    pub(crate) fn new(handle: Arc<crate::client::Handle>, request: UploadInput) -> Self {
        let deadline = request.timeout.map(|timeout| Instant::now() + timeout);
        Self {
            handle,
            request: Arc::new(request),
            upload_id: Arc::new(OnceLock::new()),
            cancel: CancellationToken::new(),
            deadline,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.request.key
    }

    /// Set the upload ID if the transfer will be done using a multipart upload
    pub(crate) fn set_upload_id(&self, upload_id: &str) {
        let _ = self.upload_id.set(upload_id.to_owned());
    }

    pub(crate) fn upload_id(&self) -> Option<&str> {
        self.upload_id.get().map(String::as_str)
    }

    /// Request cancellation of the upload
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the upload is cancelled or its timeout elapses, with the error the upload
    /// should fail with.
    pub(crate) async fn cancelled(&self) -> Error {
        match (self.deadline, self.request.timeout) {
            (Some(deadline), Some(timeout)) => tokio::select! {
                _ = self.cancel.cancelled() => error::operation_cancelled(),
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::debug!("upload timed out after {timeout:?}");
                    error::operation_timed_out(timeout)
                }
            },
            _ => {
                self.cancel.cancelled().await;
                error::operation_cancelled()
            }
        }
    }
}
