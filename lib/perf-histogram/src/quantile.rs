/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::QuantileParseError;

/// A quantile in range [0, 1], kept together with the text it was
/// configured with so that metric names stay stable.
#[derive(Clone, Debug)]
pub struct Quantile {
    value: Decimal,
    name: Cow<'static, str>,
}

macro_rules! def_const {
    ($name:ident, $num:literal, $scale:literal, $s:literal) => {
        pub const $name: Quantile = Quantile {
            value: Decimal::from_parts($num, 0, 0, false, $scale),
            name: Cow::Borrowed($s),
        };
    };
}

impl Quantile {
    def_const!(PCT50, 50, 2, "0.50");
    def_const!(PCT75, 75, 2, "0.75");
    def_const!(PCT80, 80, 2, "0.80");
    def_const!(PCT90, 90, 2, "0.90");
    def_const!(PCT95, 95, 2, "0.95");
    def_const!(PCT99, 99, 2, "0.99");
    def_const!(PCT999, 999, 3, "0.999");

    #[inline]
    pub fn value(&self) -> f64 {
        self.value.to_f64().unwrap_or_default()
    }

    #[inline]
    pub fn percentile(&self) -> f64 {
        (self.value * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or_default()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl FromStr for Quantile {
    type Err = QuantileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s)?;
        if value.is_sign_negative() || value > Decimal::ONE {
            return Err(QuantileParseError::OutOfRange);
        }
        Ok(Quantile {
            value,
            name: Cow::Owned(s.to_string()),
        })
    }
}

impl fmt::Display for Quantile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Quantile {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Quantile {}

impl PartialOrd for Quantile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn parse() {
        let q = Quantile::from_str("0.99").unwrap();
        assert_eq!(q, Quantile::PCT99);
        assert_eq!(q.as_str(), "0.99");
        assert_eq!(q.value(), 0.99);
        assert_eq!(q.percentile(), 99.0);

        let q = Quantile::from_str("0.5").unwrap();
        assert_eq!(q, Quantile::PCT50);
        assert_eq!(q.as_str(), "0.5");

        assert!(Quantile::from_str("1").is_ok());
        assert!(Quantile::from_str("0").is_ok());
    }

    #[test]
    fn parse_invalid() {
        assert!(matches!(
            Quantile::from_str("1.01"),
            Err(QuantileParseError::OutOfRange)
        ));
        assert!(matches!(
            Quantile::from_str("-0.1"),
            Err(QuantileParseError::OutOfRange)
        ));
        assert!(matches!(
            Quantile::from_str("abc"),
            Err(QuantileParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn ordered() {
        let mut set = BTreeSet::new();
        set.insert(Quantile::PCT99);
        set.insert(Quantile::PCT50);
        set.insert(Quantile::from_str("0.990").unwrap());
        set.insert(Quantile::PCT999);
        let v: Vec<_> = set.iter().map(|q| q.as_str()).collect();
        assert_eq!(v, vec!["0.50", "0.99", "0.999"]);
    }
}
