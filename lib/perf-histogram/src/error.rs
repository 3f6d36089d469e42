/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CreationError {
    #[error("lowest trackable value should be at least 1")]
    LowestIsZero,
    #[error("highest trackable value {highest} should be above lowest value {lowest}")]
    HighestNotAboveLowest { lowest: u64, highest: u64 },
    #[error("significant figures {0} out of range 1..=5")]
    SigFigOutOfRange(u8),
    #[error("lowest value {0} is too large to keep the requested precision")]
    RangeTooWide(u64),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// Parameters are `(lowest, highest, significant_figures)`.
    #[error("incompatible histogram: expected {expected:?} but got {found:?}")]
    Incompatible {
        expected: (u64, u64, u8),
        found: (u64, u64, u8),
    },
}

#[derive(Debug, Error)]
pub enum QuantileParseError {
    #[error("invalid decimal number: {0}")]
    InvalidNumber(#[from] rust_decimal::Error),
    #[error("quantile should be in range [0, 1]")]
    OutOfRange,
}
