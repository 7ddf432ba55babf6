/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;
mod input;
mod output;

mod context;
mod handle;
mod service;
mod session;

use std::cmp;
use std::sync::Arc;

use aws_sdk_s3::error::DisplayErrorContext;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::client::Handle;
use crate::error::{self, Error, ErrorKind};
use crate::io::part_reader::Builder as PartReaderBuilder;
use crate::io::{InputStream, SizeHint};
use crate::operation::multipart;
use crate::types::MAX_PARTS;
use context::UploadContext;
pub use handle::UploadHandle;
/// Request type for uploads
pub use input::{UploadInput, UploadInputBuilder};
/// Response type for uploads
pub use output::UploadOutput;
use service::PartFailure;
use session::UploadSession;

/// How a single upload will be carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadPlan {
    /// One `PutObject` request, no multipart upload session
    PutObject,
    /// A multipart upload with parts of `part_size` bytes (the last part may be smaller)
    Multipart { part_size: u64 },
}

/// Operation struct for single object upload
#[derive(Clone, Default, Debug)]
pub(crate) struct Upload;

impl Upload {
    /// Start a single `Upload` transfer operation.
    ///
    /// Picks the upload strategy up front and spawns the task that drives it. Nothing is sent
    /// to the backend before this returns.
    pub(crate) fn orchestrate(
        handle: Arc<Handle>,
        mut input: UploadInput,
    ) -> Result<UploadHandle, Error> {
        let stream = input.take_body();
        let plan = plan(&handle, &input, stream.size_hint());
        let ctx = UploadContext::new(handle, input);

        let task = match plan {
            UploadPlan::PutObject => tokio::spawn(
                put_object(ctx.clone(), stream)
                    .instrument(tracing::debug_span!("put-object", key = ctx.key())),
            ),
            UploadPlan::Multipart { part_size } => {
                let part_size = usize::try_from(part_size).map_err(|_| {
                    error::invalid_input(format!("part size {part_size} is too large"))
                })?;
                tokio::spawn(
                    multipart_upload(ctx.clone(), stream, part_size)
                        .instrument(tracing::debug_span!("multipart-upload", key = ctx.key())),
                )
            }
        };

        Ok(UploadHandle::new(ctx, task))
    }
}

/// Decide between a single request and a multipart upload.
///
/// Sources of known length at or below the multipart threshold go out as a single request.
/// The threshold is never below the effective part size, so a source that fits in one part
/// never opens a multipart upload. Sources of unknown length always use a multipart upload.
fn plan(handle: &Handle, input: &UploadInput, size_hint: SizeHint) -> UploadPlan {
    let part_size = input
        .part_size
        .unwrap_or_else(|| handle.upload_part_size_bytes());
    let content_length = size_hint.exact_len();
    let effective =
        effective_part_size(part_size, handle.backend().min_part_size(), content_length);
    let threshold = handle.mpu_threshold_bytes(effective);

    match content_length {
        Some(content_length) if content_length <= threshold => {
            tracing::trace!("upload request content size ({content_length}) does not exceed the multipart threshold ({threshold}); sending as single PutObject request");
            UploadPlan::PutObject
        }
        _ => {
            if effective != part_size {
                tracing::debug!("part size raised from {part_size} to {effective} bytes");
            }
            UploadPlan::Multipart {
                part_size: effective,
            }
        }
    }
}

/// The part size actually used: never below the backend minimum and large enough that a
/// source of known length fits in `MAX_PARTS` parts.
fn effective_part_size(part_size: u64, min_part_size: u64, content_length: Option<u64>) -> u64 {
    let effective = cmp::max(part_size, min_part_size);
    match content_length {
        Some(content_length) => cmp::max(effective, content_length.div_ceil(MAX_PARTS as u64)),
        None => effective,
    }
}

async fn put_object(ctx: UploadContext, stream: InputStream) -> Result<UploadOutput, Error> {
    tokio::select! {
        biased;
        err = ctx.cancelled() => Err(err),
        result = send_put_object(&ctx, stream) => result,
    }
}

async fn send_put_object(ctx: &UploadContext, stream: InputStream) -> Result<UploadOutput, Error> {
    let body = stream.into_bytes().await?;
    let content_length = body.len();
    let e_tag = ctx
        .handle
        .backend()
        .put_object(ctx.key(), body)
        .instrument(tracing::debug_span!("send-put-object"))
        .await
        .map_err(|err| err.into_kind(ErrorKind::UploadNotStarted))?;

    tracing::trace!("uploaded {content_length} bytes with a single request");
    Ok(UploadOutput {
        key: ctx.key().to_owned(),
        upload_id: None,
        e_tag,
        parts: Vec::new(),
    })
}

/// Drive a multipart upload to exactly one terminal call.
///
/// `CreateMultipartUpload` is never interrupted: once a session exists it is either completed
/// or aborted, even when the upload is cancelled.
async fn multipart_upload(
    ctx: UploadContext,
    stream: InputStream,
    part_size: usize,
) -> Result<UploadOutput, Error> {
    tracing::trace!("upload request using multipart upload with part size: {part_size} bytes");

    let upload_id = multipart::create_multipart_upload(&ctx.handle, ctx.key())
        .await
        .map_err(|err| err.into_kind(ErrorKind::UploadNotStarted))?;
    ctx.set_upload_id(&upload_id);

    let mut session = UploadSession::new(ctx.key(), upload_id);
    let mut reader = PartReaderBuilder::new()
        .stream(stream)
        .part_size(part_size)
        .build();
    let mut tasks = JoinSet::new();

    let result = tokio::select! {
        biased;
        err = ctx.cancelled() => Err(PartFailure::new(None, err)),
        result = service::upload_parts(&ctx, &mut session, &mut reader, &mut tasks) => result,
    };

    if let Err(failure) = result {
        // stop everything still in flight before the session is aborted
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}

        if failure.error.kind() == &ErrorKind::OperationCancelled {
            tracing::debug!("multipart upload {} cancelled, aborting", session.upload_id());
        } else {
            tracing::error!(
                "multipart upload {} failed, aborting: {}",
                session.upload_id(),
                DisplayErrorContext(&failure.error)
            );
        }

        if let Err(err) = session.abort(&ctx.handle).await {
            tracing::error!("failed to abort upload: {}", DisplayErrorContext(err));
        }
        return Err(service::aborted_error(failure, session.upload_id()));
    }

    let e_tag = session.complete(&ctx.handle).await?;
    tracing::trace!("upload completed successfully");

    Ok(UploadOutput {
        key: ctx.key().to_owned(),
        upload_id: Some(session.upload_id().to_owned()),
        e_tag,
        parts: session.completed_parts(),
    })
}
