/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeMap;

use tracing::Instrument;

use crate::client::Handle;
use crate::error::{self, Error};
use crate::operation::multipart;
use crate::types::PartResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Open,
    Completed,
    Aborted,
}

/// Local view of one multipart upload.
///
/// A session makes exactly one terminal call: either `CompleteMultipartUpload` or
/// `AbortMultipartUpload`. The state moves to the terminal state before the call is sent, so
/// a failed terminal call cannot be followed by the other one.
#[derive(Debug)]
pub(crate) struct UploadSession {
    key: String,
    upload_id: String,
    state: SessionState,
    // part# -> result, keeps the latest result for a part
    parts: BTreeMap<u32, PartResult>,
}

impl UploadSession {
    pub(crate) fn new(key: impl Into<String>, upload_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            upload_id: upload_id.into(),
            state: SessionState::Open,
            parts: BTreeMap::new(),
        }
    }

    pub(crate) fn upload_id(&self) -> &str {
        &self.upload_id
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn num_parts(&self) -> usize {
        self.parts.len()
    }

    /// Record a successfully uploaded part
    pub(crate) fn record_part(&mut self, part: PartResult) -> Result<(), Error> {
        if self.state != SessionState::Open {
            return Err(error::session_state(format!(
                "part {} reported for multipart upload {} after it was {:?}",
                part.part_number(),
                self.upload_id,
                self.state
            )));
        }
        self.parts.insert(part.part_number(), part);
        Ok(())
    }

    /// All recorded parts, ascending by part number
    pub(crate) fn completed_parts(&self) -> Vec<PartResult> {
        self.parts.values().cloned().collect()
    }

    /// Commit the upload with every recorded part.
    pub(crate) async fn complete(&mut self, handle: &Handle) -> Result<Option<String>, Error> {
        self.transition(SessionState::Completed)?;
        tracing::trace!("completing multipart upload");
        multipart::complete_multipart_upload(
            handle,
            &self.key,
            &self.upload_id,
            self.completed_parts(),
        )
        .instrument(tracing::debug_span!("complete-multipart-upload", upload_id = %self.upload_id))
        .await
    }

    /// Abort the upload. The session is considered aborted even if the backend call fails.
    pub(crate) async fn abort(&mut self, handle: &Handle) -> Result<(), Error> {
        self.transition(SessionState::Aborted)?;
        multipart::abort_multipart_upload(handle, &self.key, &self.upload_id)
            .instrument(tracing::debug_span!("abort-multipart-upload", upload_id = %self.upload_id))
            .await
    }

    fn transition(&mut self, to: SessionState) -> Result<(), Error> {
        match self.state {
            SessionState::Open => {
                self.state = to;
                Ok(())
            }
            from => Err(error::session_state(format!(
                "multipart upload {} cannot move from {:?} to {:?}",
                self.upload_id, from, to
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{SessionState, UploadSession};
    use crate::backend::{InMemoryBackend, StorageBackend};
    use crate::client::Handle;
    use crate::error::ErrorKind;
    use crate::types::PartResult;
    use crate::Config;

    fn handle(backend: Arc<InMemoryBackend>) -> Handle {
        let config = Config::builder().shared_backend(backend).build().unwrap();
        Handle { config }
    }

    #[test]
    fn test_latest_part_result_wins_and_parts_are_sorted() {
        let mut session = UploadSession::new("k", "u-1");
        session.record_part(PartResult::new(3, "e3")).unwrap();
        session.record_part(PartResult::new(1, "stale")).unwrap();
        session.record_part(PartResult::new(2, "e2")).unwrap();
        session.record_part(PartResult::new(1, "e1")).unwrap();

        assert_eq!(3, session.num_parts());
        assert_eq!(
            vec![
                PartResult::new(1, "e1"),
                PartResult::new(2, "e2"),
                PartResult::new(3, "e3")
            ],
            session.completed_parts()
        );
    }

    #[tokio::test]
    async fn test_abort_after_complete_is_a_state_error() {
        let backend = Arc::new(InMemoryBackend::with_min_part_size(1));
        let handle = handle(backend.clone());
        let upload_id = backend.create_multipart_upload("k").await.unwrap();
        let e_tag = backend
            .upload_part("k", &upload_id, 1, bytes::Bytes::from_static(b"abc"))
            .await
            .unwrap();

        let mut session = UploadSession::new("k", upload_id);
        session.record_part(PartResult::new(1, e_tag)).unwrap();
        session.complete(&handle).await.unwrap();
        assert_eq!(SessionState::Completed, session.state());

        let err = session.abort(&handle).await.unwrap_err();
        assert_eq!(&ErrorKind::SessionState, err.kind());
        let err = session.complete(&handle).await.unwrap_err();
        assert_eq!(&ErrorKind::SessionState, err.kind());
        let err = session.record_part(PartResult::new(2, "e2")).unwrap_err();
        assert_eq!(&ErrorKind::SessionState, err.kind());
    }

    #[tokio::test]
    async fn test_failed_abort_still_marks_session_aborted() {
        let backend = Arc::new(InMemoryBackend::new());
        let handle = handle(backend);

        // unknown upload id, the backend rejects the abort
        let mut session = UploadSession::new("k", "missing");
        assert!(session.abort(&handle).await.is_err());
        assert_eq!(SessionState::Aborted, session.state());

        let err = session.complete(&handle).await.unwrap_err();
        assert_eq!(&ErrorKind::SessionState, err.kind());
    }
}
