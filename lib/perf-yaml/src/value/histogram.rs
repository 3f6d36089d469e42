/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use perf_histogram::{HistogramMetricsConfig, Quantile};

pub fn as_quantile(value: &Yaml) -> anyhow::Result<Quantile> {
    match value {
        Yaml::String(s) | Yaml::Real(s) => {
            Quantile::from_str(s).map_err(|e| anyhow!("invalid quantile value: {e}"))
        }
        _ => Err(anyhow!(
            "yaml value type for 'quantile' should be 'str' or 'float'"
        )),
    }
}

pub fn as_quantile_list(value: &Yaml) -> anyhow::Result<BTreeSet<Quantile>> {
    let mut set = BTreeSet::new();
    match value {
        Yaml::String(s) => {
            for v in s.split(',') {
                let q = Quantile::from_str(v.trim())
                    .map_err(|e| anyhow!("invalid quantile string {v}: {e}"))?;
                set.insert(q);
            }
        }
        Yaml::Array(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let q =
                    as_quantile(v).context(format!("invalid quantile value for element #{i}"))?;
                set.insert(q);
            }
        }
        _ => {
            return Err(anyhow!(
                "the yaml value type for 'histogram metrics quantile' should be 'seq' or 'str'"
            ));
        }
    }
    Ok(set)
}

/// Parse histogram metrics config.
///
/// Either a map with keys `quantile`, `rotate`, `lowest`, `highest` and
/// `sigfig`, or just the rotate interval.
pub fn as_histogram_metrics_config(value: &Yaml) -> anyhow::Result<HistogramMetricsConfig> {
    if let Yaml::Hash(map) = value {
        let mut config = HistogramMetricsConfig::default();
        crate::foreach_kv(map, |k, v| match crate::key::normalize(k).as_str() {
            "quantile" => {
                let quantile_list = as_quantile_list(v)
                    .context(format!("invalid quantile list value for key {k}"))?;
                config.set_quantile_list(quantile_list);
                Ok(())
            }
            "rotate" => {
                let rotate = crate::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                config.set_rotate_interval(rotate);
                Ok(())
            }
            "lowest" | "lowest_trackable_value" => {
                let lowest = crate::value::as_u64(v)
                    .context(format!("invalid u64 value for key {k}"))?;
                config.set_lowest(lowest);
                Ok(())
            }
            "highest" | "highest_trackable_value" => {
                let highest = crate::value::as_u64(v)
                    .context(format!("invalid u64 value for key {k}"))?;
                config.set_highest(highest);
                Ok(())
            }
            "sigfig" | "significant_figures" => {
                let sigfig =
                    crate::value::as_u8(v).context(format!("invalid u8 value for key {k}"))?;
                config.set_sigfig(sigfig);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;
        config
            .check()
            .context("invalid histogram bounds or significant figures")?;
        Ok(config)
    } else {
        let rotate = crate::humanize::as_duration(value).context(
            "the value for simplified form of histogram metrics config map should be humanize duration",
        )?;
        Ok(HistogramMetricsConfig::with_rotate(rotate))
    }
}
