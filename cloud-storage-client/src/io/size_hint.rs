/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// The bounds on the remaining length of an [`InputStream`](crate::io::InputStream).
///
/// An upper bound of `None` means the stream length is not known ahead of time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHint {
    lower: u64,
    upper: Option<u64>,
}

impl SizeHint {
    /// A size hint for a stream whose length is known exactly
    pub fn exact(size: u64) -> Self {
        Self {
            lower: size,
            upper: Some(size),
        }
    }

    /// A size hint for a stream of unknown length
    pub fn unknown() -> Self {
        Self::default()
    }

    /// The lower bound on the stream length
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// The upper bound on the stream length, if known
    pub fn upper(&self) -> Option<u64> {
        self.upper
    }

    /// The exact length, if the lower and upper bound agree
    pub fn exact_len(&self) -> Option<u64> {
        self.upper.filter(|upper| *upper == self.lower)
    }
}
