/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Types for single object upload operation
pub mod upload;

/// Validated multipart upload primitives
pub(crate) mod multipart;

/// Single object download
pub(crate) mod download;

/// Object listing
pub(crate) mod list_objects;

/// Single object delete
pub(crate) mod delete_object;
