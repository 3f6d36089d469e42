/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod primary;
pub use primary::{as_u8, as_u64};

mod timer;
pub use timer::as_timer_interval;

#[cfg(feature = "histogram")]
mod histogram;
#[cfg(feature = "histogram")]
pub use histogram::{as_histogram_metrics_config, as_quantile, as_quantile_list};
