/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::Path;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::Instrument;

use crate::client::Handle;
use crate::error::Error;
use crate::validation::validate_key;

pub(crate) async fn download(handle: &Handle, key: &str) -> Result<Bytes, Error> {
    validate_key(key)?;
    let data = handle
        .backend()
        .get_object(key)
        .instrument(tracing::debug_span!("download", key))
        .await?;
    tracing::trace!("downloaded {} bytes", data.len());
    Ok(data)
}

/// Download `key` and write it to `path`.
///
/// The object is fetched completely before the file is opened, a failed download never
/// truncates an existing file.
pub(crate) async fn download_to_path(handle: &Handle, key: &str, path: &Path) -> Result<(), Error> {
    let data = download(handle, key).await?;
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&data).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::backend::{InMemoryBackend, StorageBackend};
    use crate::error::ErrorKind;
    use crate::{Client, Config};

    #[tokio::test]
    async fn test_download_to_path() {
        let backend = InMemoryBackend::new();
        backend
            .put_object("report.csv", Bytes::from_static(b"a,b\n1,2\n"))
            .await
            .unwrap();
        let client = Client::new(Config::builder().backend(backend).build().unwrap());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        client.download_to_path("report.csv", &path).await.unwrap();
        assert_eq!(b"a,b\n1,2\n".to_vec(), std::fs::read(&path).unwrap());
    }

    #[tokio::test]
    async fn test_download_missing_key() {
        let client = Client::new(
            Config::builder()
                .backend(InMemoryBackend::new())
                .build()
                .unwrap(),
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");

        let err = client.download_to_path("missing", &path).await.unwrap_err();
        assert_eq!(&ErrorKind::NotFound, err.kind());
        assert!(!path.exists());
    }
}
