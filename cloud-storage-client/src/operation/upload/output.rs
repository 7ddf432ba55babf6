/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::types::PartResult;

/// Response type for a committed upload
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutput {
    pub(crate) key: String,
    pub(crate) upload_id: Option<String>,
    pub(crate) e_tag: Option<String>,
    pub(crate) parts: Vec<PartResult>,
}

impl UploadOutput {
    /// The key the object was stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The multipart upload ID, `None` when the object was uploaded with a single request
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    /// Entity tag of the stored object, if the backend reported one
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// The parts the object was assembled from, ascending by part number.
    ///
    /// Empty for single request uploads.
    pub fn parts(&self) -> &[PartResult] {
        &self.parts
    }

    /// Returns true if the object was uploaded with a multipart upload
    pub fn is_multipart(&self) -> bool {
        self.upload_id.is_some()
    }
}
