/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio::task::JoinHandle;

use crate::error::{self, Error, ErrorKind};
use crate::operation::upload::context::UploadContext;
use crate::operation::upload::UploadOutput;
use crate::types::AbortedUpload;

/// Response type for a single upload object request.
///
/// # Cancellation
///
/// Calling [`Self::abort`] (or reaching the upload's timeout) stops reading and dispatching
/// parts, cancels in-flight part uploads, and invokes `AbortMultipartUpload` for multipart
/// uploads. Errors encountered during `AbortMultipartUpload` are logged, but do not affect
/// the overall cancellation flow.
///
/// Dropping the handle does NOT cancel the upload. The upload keeps running in the background
/// until it is completed or aborted, the result is simply no longer observable.
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadHandle {
    task: Option<JoinHandle<Result<UploadOutput, Error>>>,
    /// The context used to drive an upload to completion
    pub(crate) ctx: UploadContext,
}

impl UploadHandle {
    pub(crate) fn new(ctx: UploadContext, task: JoinHandle<Result<UploadOutput, Error>>) -> Self {
        Self {
            task: Some(task),
            ctx,
        }
    }

    /// The key being uploaded
    pub fn key(&self) -> &str {
        self.ctx.key()
    }

    /// The multipart upload ID, once `CreateMultipartUpload` succeeded
    pub fn upload_id(&self) -> Option<&str> {
        self.ctx.upload_id()
    }

    /// Consume the handle and wait for upload to complete
    #[tracing::instrument(skip_all, level = "debug", name = "join-upload")]
    pub async fn join(mut self) -> Result<UploadOutput, Error> {
        self.wait().await
    }

    /// Abort the upload and cancel any in-progress part uploads.
    ///
    /// Returns a [`SessionState`](crate::error::ErrorKind::SessionState) error if the upload
    /// was already committed, and the upload's own error if it failed before the abort took
    /// effect.
    #[tracing::instrument(skip_all, level = "debug", name = "abort-upload")]
    pub async fn abort(&mut self) -> Result<AbortedUpload, Error> {
        self.ctx.cancel();
        match self.wait().await {
            Ok(output) => Err(error::session_state(format!(
                "upload of `{}` was already completed and can no longer be aborted",
                output.key()
            ))),
            Err(err) if err.kind() == &ErrorKind::OperationCancelled => Ok(AbortedUpload {
                upload_id: self.ctx.upload_id().map(str::to_owned),
            }),
            Err(err) => Err(err),
        }
    }

    async fn wait(&mut self) -> Result<UploadOutput, Error> {
        let task = self
            .task
            .take()
            .ok_or_else(|| error::session_state("upload result was already consumed"))?;
        task.await?
    }
}
