/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("mark {0} not found")]
    MarkNotFound(String),
    #[error("invalid measure options: {0}")]
    InvalidMeasureOptions(&'static str),
    #[error("the observer mode can not be changed once set")]
    InvalidModification,
    #[error("exactly one of entry types or type must be specified")]
    InvalidObserveOptions,
}
