/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::error::{self, Error};
use crate::types::{MAX_PARTS, MIN_PART_NUMBER};

/// Object keys must be non-empty and relative (no leading `/`)
pub(crate) fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(error::invalid_input("object key must not be empty"));
    }
    if key.starts_with('/') {
        return Err(error::invalid_input(format!(
            "object key `{key}` must not start with '/'"
        )));
    }
    Ok(())
}

/// List prefixes may be empty but follow the same leading `/` rule as keys
pub(crate) fn validate_prefix(prefix: &str) -> Result<(), Error> {
    if prefix.starts_with('/') {
        return Err(error::invalid_input(format!(
            "prefix `{prefix}` must not start with '/'"
        )));
    }
    Ok(())
}

pub(crate) fn validate_part_number(part_number: u32) -> Result<(), Error> {
    if !(MIN_PART_NUMBER..=MAX_PARTS).contains(&part_number) {
        return Err(error::invalid_input(format!(
            "part number {part_number} is outside of the valid range {MIN_PART_NUMBER}..={MAX_PARTS}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_upload_id(upload_id: &str) -> Result<(), Error> {
    if upload_id.is_empty() {
        return Err(error::invalid_input("upload ID must not be empty"));
    }
    Ok(())
}
