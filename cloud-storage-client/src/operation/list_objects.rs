/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tracing::Instrument;

use crate::client::Handle;
use crate::error::Error;
use crate::types::ObjectSummary;
use crate::validation::validate_prefix;

pub(crate) async fn list_objects(
    handle: &Handle,
    prefix: &str,
) -> Result<Vec<ObjectSummary>, Error> {
    validate_prefix(prefix)?;
    handle
        .backend()
        .list_objects(prefix)
        .instrument(tracing::debug_span!("list-objects", prefix))
        .await
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::backend::{InMemoryBackend, StorageBackend};
    use crate::error::ErrorKind;
    use crate::{Client, Config};

    #[tokio::test]
    async fn test_list_files_by_prefix() {
        let backend = InMemoryBackend::new();
        for key in ["logs/2024/a", "logs/2024/b", "logs/2025/a", "other"] {
            backend.put_object(key, Bytes::from_static(b"x")).await.unwrap();
        }
        let client = Client::new(Config::builder().backend(backend).build().unwrap());

        assert_eq!(
            vec!["logs/2024/a", "logs/2024/b"],
            client.list_files("logs/2024/").await.unwrap()
        );
        assert_eq!(4, client.list_files("").await.unwrap().len());
        assert!(client.list_files("nothing/").await.unwrap().is_empty());

        let err = client.list_files("/logs").await.unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
    }
}
