/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! A small object storage client.
//!
//! Objects can be uploaded, downloaded, listed and deleted through a single
//! [`Client`]. The client talks to storage through the [`StorageBackend`](crate::backend::StorageBackend)
//! capability set. Amazon S3 is provided by [`S3Backend`](crate::backend::S3Backend) and an
//! in-process [`InMemoryBackend`](crate::backend::InMemoryBackend) is available for local use.
//!
//! Large uploads are split into parts and driven through a multipart upload session that
//! always ends in exactly one of `CompleteMultipartUpload` or `AbortMultipartUpload`.
//!
//! # Examples
//!
//! Load the default configuration (reads `AWS_BUCKET_NAME` and `AWS_REGION`):
//!
//! ```no_run
//! # async fn example() -> Result<(), cloud_storage_client::error::Error> {
//! let config = cloud_storage_client::from_env().load().await?;
//! let client = cloud_storage_client::Client::new(config);
//!
//! for key in client.list_files("reports/").await? {
//!     println!("{key}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Upload a local file:
//!
//! ```no_run
//! # async fn example(client: cloud_storage_client::Client) -> Result<(), cloud_storage_client::error::Error> {
//! use cloud_storage_client::io::InputStream;
//!
//! let handle = client
//!     .upload()
//!     .key("backups/db.tar")
//!     .body(InputStream::from_path("/tmp/db.tar")?)
//!     .initiate()?;
//!
//! let output = handle.join().await?;
//! println!("uploaded with etag {:?}", output.e_tag());
//! # Ok(())
//! # }
//! ```

/// Default number of in-flight part uploads per transfer
pub(crate) const DEFAULT_CONCURRENCY: usize = 8;

/// Error types emitted by `cloud-storage-client`
pub mod error;

/// Common types used by `cloud-storage-client`
pub mod types;

/// Types and helpers for I/O
pub mod io;

/// Storage backends
pub mod backend;

/// Storage client
pub mod client;

/// Client operations
pub mod operation;

/// Client configuration
pub mod config;

/// Tower related middleware and components
pub(crate) mod middleware;

/// Input validation shared by all operations
pub(crate) mod validation;

pub use self::client::Client;
use self::config::loader::ConfigLoader;
pub use self::config::Config;

/// Create a config loader that reads its settings from the environment
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
