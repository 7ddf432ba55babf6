/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinSet};
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};
use tracing::Instrument;

use crate::error::{self, Error, ErrorKind};
use crate::io::part_reader::{PartData, PartReader};
use crate::middleware::retry::RetryPolicy;
use crate::operation::multipart;
use crate::operation::upload::context::UploadContext;
use crate::operation::upload::session::UploadSession;
use crate::types::PartResult;

/// Request/input type for our "upload_part" service.
#[derive(Debug, Clone)]
pub(super) struct UploadPartRequest {
    pub(super) ctx: UploadContext,
    pub(super) upload_id: String,
    pub(super) part_data: PartData,
}

/// The error that ended the part upload loop, tagged with the part that caused it (if any)
#[derive(Debug)]
pub(super) struct PartFailure {
    pub(super) part_number: Option<u32>,
    pub(super) error: Error,
}

impl PartFailure {
    pub(super) fn new(part_number: Option<u32>, error: Error) -> Self {
        Self { part_number, error }
    }
}

impl From<JoinError> for PartFailure {
    fn from(value: JoinError) -> Self {
        Self::new(None, value.into())
    }
}

/// handler (service fn) for a single part
async fn upload_part_handler(request: UploadPartRequest) -> Result<PartResult, Error> {
    let ctx = request.ctx;
    let part_data = request.part_data;
    multipart::upload_part(
        &ctx.handle,
        ctx.key(),
        &request.upload_id,
        part_data.part_number,
        part_data.data,
    )
    .await
}

/// Create a new tower::Service for uploading individual parts with retries
pub(super) fn upload_part_service(
    ctx: &UploadContext,
) -> impl Service<UploadPartRequest, Response = PartResult, Error = Error, Future: Send>
       + Clone
       + Send {
    let svc = service_fn(upload_part_handler);
    ServiceBuilder::new()
        .retry(RetryPolicy::new(ctx.handle.part_retry().clone()))
        .service(svc)
}

type PartTasks = JoinSet<Result<PartResult, PartFailure>>;

/// Read parts from `reader` and upload them with at most `num_workers` parts in flight.
///
/// This is the only writer of `session`. Returns once every dispatched part has been recorded,
/// or on the first failure. On failure, parts still in `tasks` are left for the caller to
/// cancel and join.
pub(super) async fn upload_parts(
    ctx: &UploadContext,
    session: &mut UploadSession,
    reader: &mut PartReader,
    tasks: &mut PartTasks,
) -> Result<(), PartFailure> {
    let svc = upload_part_service(ctx);
    let max_in_flight = ctx.handle.num_workers();
    let mut dispatched = 0;

    loop {
        // record anything that already finished without waiting
        while let Some(joined) = tasks.join_next().now_or_never().flatten() {
            record(session, joined)?;
        }

        if tasks.len() >= max_in_flight {
            if let Some(joined) = tasks.join_next().await {
                record(session, joined)?;
            }
            continue;
        }

        let part_data = match reader.next_part().await {
            Ok(Some(part_data)) => part_data,
            Ok(None) => break,
            Err(err) => return Err(PartFailure::new(None, err.into())),
        };

        let part_number = part_data.part_number;
        let req = UploadPartRequest {
            ctx: ctx.clone(),
            upload_id: session.upload_id().to_owned(),
            part_data,
        };
        let svc = svc.clone();
        let task = async move {
            svc.oneshot(req)
                .await
                .map_err(|err| PartFailure::new(Some(part_number), err))
        };
        tasks.spawn(task.instrument(tracing::debug_span!("upload-part", part_number)));
        dispatched += 1;
    }

    tracing::trace!("all {dispatched} parts dispatched, waiting for in-flight parts");
    while let Some(joined) = tasks.join_next().await {
        record(session, joined)?;
    }

    if dispatched != session.num_parts() {
        return Err(PartFailure::new(
            None,
            Error::new(
                ErrorKind::RuntimeError,
                format!(
                    "dispatched {dispatched} parts but {} were recorded",
                    session.num_parts()
                ),
            ),
        ));
    }
    Ok(())
}

fn record(
    session: &mut UploadSession,
    joined: Result<Result<PartResult, PartFailure>, JoinError>,
) -> Result<(), PartFailure> {
    let part = joined??;
    let part_number = part.part_number();
    session
        .record_part(part)
        .map_err(|err| PartFailure::new(Some(part_number), err))
}

/// Turn the failure that stopped an upload into the error reported to the caller.
pub(super) fn aborted_error(failure: PartFailure, upload_id: &str) -> Error {
    let PartFailure { part_number, error: err } = failure;
    if matches!(
        err.kind(),
        ErrorKind::OperationCancelled | ErrorKind::SessionState
    ) {
        return err;
    }
    err.into_kind(ErrorKind::UploadAborted(error::AbortedPart::new(
        upload_id,
        part_number,
    )))
}

#[cfg(test)]
mod tests {
    use super::{aborted_error, PartFailure};
    use crate::error::{self, ErrorKind};

    #[test]
    fn test_part_failure_becomes_aborted_error() {
        let err = aborted_error(
            PartFailure::new(Some(2), error::backend("connection reset")),
            "u-1",
        );
        match err.kind() {
            ErrorKind::UploadAborted(aborted) => {
                assert_eq!("u-1", aborted.upload_id());
                assert_eq!(Some(2), aborted.part_number());
            }
            other => panic!("unexpected error kind {other:?}"),
        }
    }

    #[test]
    fn test_cancellation_is_not_rewrapped() {
        let err = aborted_error(PartFailure::new(None, error::operation_cancelled()), "u-1");
        assert_eq!(&ErrorKind::OperationCancelled, err.kind());
    }
}
