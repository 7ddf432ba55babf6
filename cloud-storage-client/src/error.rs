/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::time::Duration;

use aws_sdk_s3::error::ProvideErrorMetadata;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
///
/// The [`ErrorKind`] tells a caller how far an upload got before it failed:
///
/// * never started: [`ErrorKind::InputInvalid`], [`ErrorKind::UploadNotStarted`]
/// * aborted after partial progress: [`ErrorKind::UploadAborted`], [`ErrorKind::OperationCancelled`]
/// * remote state unknown: [`ErrorKind::CompleteFailed`]
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues. Detected before any request is sent.
    InputInvalid,

    /// I/O errors
    IOError,

    /// A request to the storage backend failed
    BackendError,

    /// Resource not found (e.g. bucket, key, multipart upload ID not found)
    NotFound,

    /// The upload failed before a multipart upload session existed
    UploadNotStarted,

    /// A part failed to upload and the multipart upload was aborted
    UploadAborted(AbortedPart),

    /// `CompleteMultipartUpload` failed, the state of the upload in the backend is unknown
    CompleteFailed,

    /// A multipart upload session was asked to make an invalid state transition
    /// (e.g. abort after complete). This is a logic error and must not be ignored.
    SessionState,

    /// The operation was cancelled by the caller (explicit abort or timeout).
    /// [`Error::is_timeout`] tells the two apart.
    OperationCancelled,

    /// Some kind of internal runtime issue (e.g. task failure)
    RuntimeError,
}

/// Identifies the part whose failure caused a multipart upload to be aborted
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AbortedPart {
    upload_id: String,
    part_number: Option<u32>,
}

impl AbortedPart {
    pub(crate) fn new(upload_id: impl Into<String>, part_number: Option<u32>) -> Self {
        Self {
            upload_id: upload_id.into(),
            part_number,
        }
    }

    /// The ID of the multipart upload that was aborted
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// The part that failed, if the failure can be attributed to a single part
    pub fn part_number(&self) -> Option<u32> {
        self.part_number
    }
}

impl Error {
    /// Creates a new [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if the failed operation never started a multipart upload session
    /// (nothing was left behind in the backend).
    pub fn is_not_started(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InputInvalid | ErrorKind::UploadNotStarted
        )
    }

    /// Returns true if a multipart upload was started and then aborted
    pub fn is_aborted(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UploadAborted(_) | ErrorKind::OperationCancelled
        )
    }

    /// Returns true if the operation was cancelled because it ran past its timeout, as
    /// opposed to an explicit abort by the caller
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::OperationCancelled
            && self.source.downcast_ref::<TimedOut>().is_some()
    }

    /// Re-tag this error with a new kind, keeping this error as the source
    pub(crate) fn into_kind(self, kind: ErrorKind) -> Error {
        Error::new(kind, self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::BackendError => write!(f, "storage backend request failed"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::UploadNotStarted => write!(f, "upload failed to start"),
            ErrorKind::UploadAborted(aborted) => match aborted.part_number {
                Some(part_number) => write!(
                    f,
                    "part {} failed, multipart upload {} aborted",
                    part_number, aborted.upload_id
                ),
                None => write!(f, "multipart upload {} aborted", aborted.upload_id),
            },
            ErrorKind::CompleteFailed => write!(f, "failed to complete multipart upload"),
            ErrorKind::SessionState => write!(f, "invalid multipart upload session state"),
            ErrorKind::OperationCancelled => write!(f, "operation cancelled"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<crate::io::error::Error> for Error {
    fn from(value: crate::io::error::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl From<aws_smithy_types::byte_stream::error::Error> for Error {
    fn from(value: aws_smithy_types::byte_stream::error::Error) -> Self {
        Self::new(ErrorKind::BackendError, value)
    }
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        let kind = match value.code() {
            Some("NotFound" | "NoSuchKey" | "NoSuchUpload" | "NoSuchBucket") => ErrorKind::NotFound,
            _ => ErrorKind::BackendError,
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn not_found<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::NotFound, err)
}

pub(crate) fn backend<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::BackendError, err)
}

pub(crate) fn session_state<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::SessionState, err)
}

static CANCELLATION_ERROR: &str = "upload was cancelled by the caller";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::OperationCancelled, CANCELLATION_ERROR)
}

/// Source of the cancellation error raised when an upload runs past its deadline
#[derive(Debug)]
struct TimedOut(Duration);

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upload did not finish within {:?}", self.0)
    }
}

impl std::error::Error for TimedOut {}

pub(crate) fn operation_timed_out(timeout: Duration) -> Error {
    Error::new(ErrorKind::OperationCancelled, TimedOut(timeout))
}
