/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

/// Parse a timer interval or sampling resolution.
///
/// A plain integer is taken as milliseconds, other forms follow
/// [`as_duration`](crate::humanize::as_duration). Zero is rejected.
pub fn as_timer_interval(v: &Yaml) -> anyhow::Result<Duration> {
    let interval = match v {
        Yaml::Integer(i) => {
            let ms = u64::try_from(*i).map_err(|_| anyhow!("negative timer interval {i}"))?;
            Duration::from_millis(ms)
        }
        _ => crate::humanize::as_duration(v).context("invalid timer interval")?,
    };
    if interval.is_zero() {
        return Err(anyhow!("timer interval should not be zero"));
    }
    Ok(interval)
}
