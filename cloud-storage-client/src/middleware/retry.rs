/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio::time::Sleep;

use crate::error::{Error, ErrorKind};
use crate::types::PartRetry;

/// A `tower::retry::Policy` implementation for retrying requests
///
/// Every request gets its own copy of the policy (tower clones it per call), so the attempt
/// counter is per request.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    config: PartRetry,
    // attempts made so far, including the first one
    attempts: u32,
}

impl RetryPolicy {
    pub(crate) fn new(config: PartRetry) -> Self {
        Self {
            config,
            attempts: 1,
        }
    }
}

/// Only backend failures are worth another attempt. Validation, I/O and not-found errors
/// would fail the same way again.
fn is_retryable(err: &Error) -> bool {
    matches!(err.kind(), ErrorKind::BackendError)
}

impl<Req, Res> tower::retry::Policy<Req, Res, Error> for RetryPolicy
where
    Req: Clone,
{
    type Future = Sleep;

    fn retry(&mut self, _req: &mut Req, result: &mut Result<Res, Error>) -> Option<Self::Future> {
        let err = result.as_ref().err()?;
        if !is_retryable(err) || self.attempts >= self.config.max_attempts() {
            return None;
        }

        let backoff = self.config.backoff(self.attempts);
        self.attempts += 1;
        tracing::debug!(
            "retrying failed request (attempt {} of {}) after {:?}: {}",
            self.attempts,
            self.config.max_attempts(),
            backoff,
            err
        );
        Some(tokio::time::sleep(backoff))
    }

    fn clone_request(&mut self, req: &Req) -> Option<Req> {
        Some(req.clone())
    }
}
