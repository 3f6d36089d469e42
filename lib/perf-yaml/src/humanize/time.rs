/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use humanize_rs::ParseError;
use yaml_rust::Yaml;

/// Parse a duration like `4s` or `1m30s`. Bare numbers are seconds.
pub fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(v) => Ok(v),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(value) {
                    Ok(Duration::from_secs(u))
                } else if let Ok(f) = f64::from_str(value) {
                    Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
                } else {
                    Err(anyhow!("invalid duration string"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(value) => u64::try_from(*value)
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("negative duration {value}")),
        Yaml::Real(s) => {
            let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 value: {e}"))?;
            Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer' or 'real'"
        )),
    }
}
