/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tracing::Instrument;

use crate::client::Handle;
use crate::error::Error;
use crate::validation::validate_key;

/// Delete a single object. Deleting a key that does not exist succeeds.
pub(crate) async fn delete_object(handle: &Handle, key: &str) -> Result<(), Error> {
    validate_key(key)?;
    handle
        .backend()
        .delete_object(key)
        .instrument(tracing::debug_span!("delete-object", key))
        .await
}
