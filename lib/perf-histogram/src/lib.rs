/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::{CreationError, MergeError, QuantileParseError};

mod histogram;
pub use histogram::{DEFAULT_HIGHEST, DEFAULT_LOWEST, DEFAULT_SIGFIG, Histogram};

mod iter;
pub use iter::PercentileIter;

mod recordable;
pub use recordable::RecordableHistogram;

mod recorder;
pub use recorder::HistogramRecorder;

mod rotating;
pub use rotating::RotatingHistogram;

mod interval;
pub use interval::IntervalHistogram;

mod stats;
pub use stats::HistogramStats;

mod quantile;
pub use quantile::Quantile;

mod config;
pub use config::HistogramMetricsConfig;
