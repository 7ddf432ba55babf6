/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;

use crate::client::Handle;
use crate::error::{Error, ErrorKind};
use crate::types::PartResult;
use crate::validation::{validate_key, validate_part_number, validate_upload_id};

/// Start a new multipart upload by invoking `CreateMultipartUpload`
pub(crate) async fn create_multipart_upload(handle: &Handle, key: &str) -> Result<String, Error> {
    validate_key(key)?;
    let upload_id = handle.backend().create_multipart_upload(key).await?;
    tracing::trace!("multipart upload started with upload id: {upload_id}");
    Ok(upload_id)
}

/// Upload a single part of a multipart upload by invoking `UploadPart`
pub(crate) async fn upload_part(
    handle: &Handle,
    key: &str,
    upload_id: &str,
    part_number: u32,
    body: Bytes,
) -> Result<PartResult, Error> {
    validate_key(key)?;
    validate_upload_id(upload_id)?;
    validate_part_number(part_number)?;

    let e_tag = handle
        .backend()
        .upload_part(key, upload_id, part_number, body)
        .await?;
    tracing::trace!("completed upload of part number {part_number}");
    Ok(PartResult::new(part_number, e_tag))
}

/// Commit a multipart upload by invoking `CompleteMultipartUpload`.
///
/// Parts are sorted by part number before they are sent. Listing a part number twice is
/// rejected.
pub(crate) async fn complete_multipart_upload(
    handle: &Handle,
    key: &str,
    upload_id: &str,
    mut parts: Vec<PartResult>,
) -> Result<Option<String>, Error> {
    validate_key(key)?;
    validate_upload_id(upload_id)?;
    if parts.is_empty() {
        return Err(crate::error::invalid_input(
            "a multipart upload must be completed with at least one part",
        ));
    }
    for part in &parts {
        validate_part_number(part.part_number())?;
    }

    // parts must be sorted
    parts.sort_by_key(|p| p.part_number());
    if let Some(w) = parts.windows(2).find(|w| w[0].part_number() == w[1].part_number()) {
        return Err(crate::error::invalid_input(format!(
            "part {} listed more than once",
            w[0].part_number()
        )));
    }

    handle
        .backend()
        .complete_multipart_upload(key, upload_id, &parts)
        .await
        .map_err(|err| err.into_kind(ErrorKind::CompleteFailed))
}

/// Abort a multipart upload by invoking `AbortMultipartUpload`
pub(crate) async fn abort_multipart_upload(
    handle: &Handle,
    key: &str,
    upload_id: &str,
) -> Result<(), Error> {
    validate_key(key)?;
    validate_upload_id(upload_id)?;
    handle.backend().abort_multipart_upload(key, upload_id).await
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::backend::InMemoryBackend;
    use crate::error::ErrorKind;
    use crate::types::PartResult;
    use crate::{Client, Config};

    fn client() -> Client {
        let config = Config::builder()
            .backend(InMemoryBackend::with_min_part_size(1))
            .build()
            .unwrap();
        Client::new(config)
    }

    #[tokio::test]
    async fn test_rejects_invalid_input_before_backend_call() {
        let client = client();
        let err = client.create_multipart_upload("").await.unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
        let err = client.create_multipart_upload("/abs").await.unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());

        let upload_id = client.create_multipart_upload("k").await.unwrap();
        for part_number in [0, 10_001] {
            let err = client
                .upload_part("k", &upload_id, part_number, Bytes::from_static(b"x"))
                .await
                .unwrap_err();
            assert_eq!(&ErrorKind::InputInvalid, err.kind());
        }
        client.abort_multipart_upload("k", &upload_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_sorts_parts() {
        let client = client();
        let upload_id = client.create_multipart_upload("k").await.unwrap();
        let p2 = client
            .upload_part("k", &upload_id, 2, Bytes::from_static(b"world"))
            .await
            .unwrap();
        let p1 = client
            .upload_part("k", &upload_id, 1, Bytes::from_static(b"hello "))
            .await
            .unwrap();

        client
            .complete_multipart_upload("k", &upload_id, vec![p2, p1])
            .await
            .unwrap();
        assert_eq!(
            Bytes::from_static(b"hello world"),
            client.download("k").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_complete_rejects_duplicate_and_empty_parts() {
        let client = client();
        let err = client
            .complete_multipart_upload("k", "upload-1", vec![])
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());

        let err = client
            .complete_multipart_upload(
                "k",
                "upload-1",
                vec![PartResult::new(1, "a"), PartResult::new(1, "b")],
            )
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }

    #[tokio::test]
    async fn test_complete_unknown_upload_fails() {
        let err = client()
            .complete_multipart_upload("k", "nope", vec![PartResult::new(1, "a")])
            .await
            .unwrap_err();
        assert_eq!(&ErrorKind::CompleteFailed, err.kind());
    }
}
