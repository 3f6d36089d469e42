/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::anyhow;
use yaml_rust::Yaml;

pub fn as_u8(v: &Yaml) -> anyhow::Result<u8> {
    match v {
        Yaml::String(s) => Ok(u8::from_str(s)?),
        Yaml::Integer(i) => Ok(u8::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'u8' should be 'string' or 'integer'"
        )),
    }
}

pub fn as_u64(v: &Yaml) -> anyhow::Result<u64> {
    match v {
        Yaml::String(s) => Ok(u64::from_str(s)?),
        Yaml::Integer(i) => Ok(u64::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'u64' should be 'string' or 'integer'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned() {
        assert_eq!(as_u8(&Yaml::Integer(3)).unwrap(), 3);
        assert_eq!(as_u8(&Yaml::String("5".to_string())).unwrap(), 5);
        assert!(as_u8(&Yaml::Integer(256)).is_err());
        assert!(as_u8(&Yaml::Real("3.0".to_string())).is_err());

        assert_eq!(
            as_u64(&Yaml::Integer(3_600_000_000_000)).unwrap(),
            3_600_000_000_000
        );
        assert!(as_u64(&Yaml::Integer(-1)).is_err());
    }
}
