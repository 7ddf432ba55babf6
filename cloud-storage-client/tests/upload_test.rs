/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use aws_smithy_runtime::test_util::capture_test_logs::capture_test_logs;
use bytes::Bytes;
use cloud_storage_client::error::{Error, ErrorKind};
use cloud_storage_client::io::InputStream;
use cloud_storage_client::types::{PartResult, PartRetry};
use test_common::{create_test_file, test_client, Call, RecordingBackend};

fn is_create(call: &Call) -> bool {
    matches!(call, Call::CreateMultipartUpload { .. })
}

fn is_part(call: &Call) -> bool {
    matches!(call, Call::UploadPart { .. })
}

fn is_complete(call: &Call) -> bool {
    matches!(call, Call::CompleteMultipartUpload { .. })
}

fn is_abort(call: &Call) -> bool {
    matches!(call, Call::AbortMultipartUpload { .. })
}

fn is_put(call: &Call) -> bool {
    matches!(call, Call::PutObject { .. })
}

fn fast_retry(max_attempts: u32) -> PartRetry {
    PartRetry::new(max_attempts)
        .with_initial_backoff(Duration::from_millis(1))
        .with_max_backoff(Duration::from_millis(5))
}

/// part numbers sent with the (single) complete call
fn completed_part_numbers(backend: &RecordingBackend) -> Vec<u32> {
    backend
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::CompleteMultipartUpload { parts, .. } => {
                Some(parts.iter().map(PartResult::part_number).collect())
            }
            _ => None,
        })
        .expect("complete was called")
}

#[tokio::test]
async fn test_multipart_upload_completes_with_ordered_parts() {
    let (_guard, _rx) = capture_test_logs();
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let output = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert!(output.is_multipart());
    assert_eq!(2, output.parts().len());
    assert_eq!(1, output.parts()[0].part_number());
    assert_eq!(2, output.parts()[1].part_number());

    assert_eq!(1, backend.count(is_create));
    assert_eq!(2, backend.count(is_part));
    assert_eq!(1, backend.count(is_complete));
    assert_eq!(0, backend.count(is_abort));

    let upload_id = output.upload_id().unwrap().to_owned();
    assert_eq!(
        Some(&Call::CompleteMultipartUpload {
            upload_id,
            parts: output.parts().to_vec(),
        }),
        backend.calls().last()
    );
    assert_eq!(
        Bytes::from_static(b"abcdef"),
        client.download("k").await.unwrap()
    );
}

#[tokio::test]
async fn test_failed_part_aborts_once_and_never_completes() {
    let backend = Arc::new(RecordingBackend::new(1).fail_part(2, 1));
    let client = test_client(backend.clone(), 3, 1, PartRetry::disabled());

    let err = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdefghi"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    match err.kind() {
        ErrorKind::UploadAborted(aborted) => assert_eq!(Some(2), aborted.part_number()),
        other => panic!("unexpected error kind {other:?}"),
    }
    // the original part failure is kept as the source
    let source = err.source().unwrap().downcast_ref::<Error>().unwrap();
    assert_eq!(&ErrorKind::BackendError, source.kind());
    assert_eq!(
        "injected upload part failure",
        source.source().unwrap().to_string()
    );

    assert_eq!(1, backend.count(is_abort));
    assert_eq!(0, backend.count(is_complete));
    // no parts are read or sent after the failure
    assert!(!backend.calls().contains(&Call::UploadPart {
        upload_id: "upload-1".to_owned(),
        part_number: 3,
    }));
    assert_eq!(0, backend.inner().open_uploads().await);
}

#[tokio::test]
async fn test_abort_failure_does_not_mask_part_failure() {
    let backend = Arc::new(RecordingBackend::new(1).fail_part(1, 1).fail_abort());
    let client = test_client(backend.clone(), 3, 1, PartRetry::disabled());

    let err = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::UploadAborted(_)));
    assert_eq!(1, backend.count(is_abort));
    assert_eq!(0, backend.count(is_complete));
}

#[tokio::test]
async fn test_part_retried_within_bound_succeeds() {
    let backend = Arc::new(RecordingBackend::new(1).fail_part(2, 2));
    let client = test_client(backend.clone(), 3, 2, fast_retry(3));

    let output = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdefghi"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(3, output.parts().len());
    // part 2 was attempted three times
    assert_eq!(5, backend.count(is_part));
    assert_eq!(1, backend.count(is_complete));
    assert_eq!(0, backend.count(is_abort));
}

#[tokio::test]
async fn test_part_exhausting_retries_aborts() {
    let backend = Arc::new(RecordingBackend::new(1).fail_part(1, 3));
    let client = test_client(backend.clone(), 3, 1, fast_retry(3));

    let err = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(3, backend.count(is_part));
    assert_eq!(1, backend.count(is_abort));
}

#[tokio::test]
async fn test_small_uploads_use_single_request() {
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let empty = client
        .upload()
        .key("empty")
        .body(InputStream::from_static(b""))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert!(!empty.is_multipart());

    // exactly one part's worth of data
    let one_part = client
        .upload()
        .key("one-part")
        .body(InputStream::from_static(b"abc"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(None, one_part.upload_id());
    assert!(one_part.e_tag().is_some());

    assert_eq!(2, backend.count(is_put));
    assert_eq!(0, backend.count(is_create));
    assert_eq!(Bytes::new(), client.download("empty").await.unwrap());
}

#[tokio::test]
async fn test_single_request_when_backend_minimum_covers_source() {
    // the configured 3 byte part is raised to the 8 byte minimum, which holds the whole body
    let backend = Arc::new(RecordingBackend::new(8));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let output = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert!(!output.is_multipart());
    assert_eq!(1, backend.count(is_put));
    assert_eq!(0, backend.count(is_create));
    assert_eq!(
        Bytes::from_static(b"abcdef"),
        client.download("k").await.unwrap()
    );
}

#[tokio::test]
async fn test_invalid_input_never_reaches_backend() {
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    for key in ["", "/rooted"] {
        let err = client
            .upload()
            .key(key)
            .body(InputStream::from_static(b"abcdef"))
            .initiate()
            .unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
        assert!(err.is_not_started());
    }

    let err = client
        .upload()
        .key("k")
        .part_size(0)
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_failed_create_is_not_started() {
    let backend = Arc::new(RecordingBackend::new(1).fail_create());
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let err = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::UploadNotStarted, err.kind());
    assert_eq!(vec![Call::CreateMultipartUpload { key: "k".to_owned() }], backend.calls());
}

#[tokio::test]
async fn test_failed_complete_is_not_aborted() {
    let backend = Arc::new(RecordingBackend::new(1).fail_complete());
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let err = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::CompleteFailed, err.kind());
    assert_eq!(1, backend.count(is_complete));
    assert_eq!(0, backend.count(is_abort));
}

#[tokio::test]
async fn test_out_of_order_part_completion() {
    let backend = Arc::new(RecordingBackend::new(1).delay_part(1, Duration::from_millis(100)));
    let client = test_client(backend.clone(), 3, 3, PartRetry::disabled());

    let output = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdefghi"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(vec![1, 2, 3], completed_part_numbers(&backend));
    assert_eq!(3, output.parts().len());
    assert_eq!(
        Bytes::from_static(b"abcdefghi"),
        client.download("k").await.unwrap()
    );
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let mut backend = RecordingBackend::new(1);
    for part_number in 1..=6 {
        backend = backend.delay_part(part_number, Duration::from_millis(20));
    }
    let backend = Arc::new(backend);
    let client = test_client(backend.clone(), 2, 2, PartRetry::disabled());

    client
        .upload()
        .key("k")
        .body(InputStream::from(vec![b'x'; 12]))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(6, backend.count(is_part));
    // both workers were busy at once, and never more than that
    assert_eq!(2, backend.max_in_flight());
}

#[tokio::test]
async fn test_abort_cancels_in_flight_upload() {
    let backend = Arc::new(RecordingBackend::new(1).delay_part(2, Duration::from_secs(30)));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let mut handle = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap();

    // wait until the slow part is in flight
    while backend.count(is_part) < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let aborted = handle.abort().await.unwrap();
    assert_eq!(Some("upload-1"), aborted.upload_id());
    assert_eq!(1, backend.count(is_abort));
    assert_eq!(0, backend.count(is_complete));
    assert_eq!(0, backend.inner().open_uploads().await);
}

#[tokio::test]
async fn test_timeout_aborts_upload() {
    let backend = Arc::new(RecordingBackend::new(1).delay_part(1, Duration::from_secs(30)));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let err = client
        .upload()
        .key("k")
        .timeout(Duration::from_millis(50))
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap_err();

    assert_eq!(&ErrorKind::OperationCancelled, err.kind());
    assert!(err.is_timeout());
    assert_eq!(1, backend.count(is_abort));
    assert_eq!(0, backend.count(is_complete));
}

#[tokio::test]
async fn test_abort_after_complete_is_a_state_error() {
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let mut handle = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap();

    // once complete has been sent the upload can no longer be cancelled
    while backend.count(is_complete) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let err = handle.abort().await.unwrap_err();
    assert_eq!(&ErrorKind::SessionState, err.kind());
    assert_eq!(0, backend.count(is_abort));
}

#[tokio::test]
async fn test_dropped_handle_still_completes() {
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let handle = client
        .upload()
        .key("k")
        .body(InputStream::from_static(b"abcdef"))
        .initiate()
        .unwrap();
    drop(handle);

    tokio::time::timeout(Duration::from_secs(5), async {
        while client.download("k").await.is_err() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(1, backend.count(is_complete));
}

#[tokio::test]
async fn test_upload_from_reader() {
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    // unknown length, multipart even though the data would fit in one part
    let output = client
        .upload()
        .key("small")
        .body(InputStream::from_reader(&b"ab"[..]))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert!(output.is_multipart());
    assert_eq!(1, output.parts().len());

    let output = client
        .upload()
        .key("k")
        .body(InputStream::from_reader(&b"abcdefg"[..]))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(3, output.parts().len());
    assert_eq!(
        Bytes::from_static(b"abcdefg"),
        client.download("k").await.unwrap()
    );
}

#[tokio::test]
async fn test_upload_file() {
    let contents = b"the quick brown fox";
    let file = create_test_file(contents);
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 4, 2, PartRetry::disabled());

    let output = client.upload_file(file.path(), "fox.txt").await.unwrap();
    assert_eq!(5, output.parts().len());
    assert_eq!(vec![1, 2, 3, 4, 5], completed_part_numbers(&backend));
    assert_eq!(
        Bytes::from_static(contents),
        client.download("fox.txt").await.unwrap()
    );
}

#[tokio::test]
async fn test_part_size_override() {
    let backend = Arc::new(RecordingBackend::new(1));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let output = client
        .upload()
        .key("k")
        .part_size(4)
        .body(InputStream::from_static(b"abcdefghi"))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    assert_eq!(3, output.parts().len());
    assert_eq!(3, backend.count(is_part));
}

#[tokio::test]
async fn test_part_size_raised_to_backend_minimum() {
    let backend = Arc::new(RecordingBackend::new(5));
    let client = test_client(backend.clone(), 3, 2, PartRetry::disabled());

    let output = client
        .upload()
        .key("k")
        .body(InputStream::from_reader(&b"abcdefghijk"[..]))
        .initiate()
        .unwrap()
        .join()
        .await
        .unwrap();
    // 5 + 5 + 1 bytes
    assert_eq!(3, output.parts().len());
}
