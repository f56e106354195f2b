/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::error::ConfigError;
use crate::metrics::MetricTagValue;

/// A percentile in range [0, 100], such as `99.9` for p999.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Percentile(f64);

impl Percentile {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Percentile(value))
        } else {
            Err(ConfigError::InvalidPercentile(value))
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// The same point as a quantile in range [0, 1].
    #[inline]
    pub fn quantile(&self) -> f64 {
        self.0 / 100.0
    }

    /// Value of the `statistic` tag, like `percentile_99` or `percentile_99.90`.
    pub fn label(&self) -> String {
        let s = format!("percentile_{:.2}", self.0);
        match s.strip_suffix(".00") {
            Some(trimmed) => trimmed.to_string(),
            None => s,
        }
    }

    pub(crate) fn tag_value(&self) -> MetricTagValue {
        MetricTagValue::new_unchecked(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label() {
        assert_eq!(Percentile::new(99.0).unwrap().label(), "percentile_99");
        assert_eq!(Percentile::new(99.9).unwrap().label(), "percentile_99.90");
        assert_eq!(Percentile::new(99.99).unwrap().label(), "percentile_99.99");
        assert_eq!(Percentile::new(50.0).unwrap().label(), "percentile_50");
        assert_eq!(Percentile::new(0.0).unwrap().label(), "percentile_0");
        assert_eq!(Percentile::new(100.0).unwrap().label(), "percentile_100");
        assert_eq!(Percentile::new(99.001).unwrap().label(), "percentile_99");
    }

    #[test]
    fn invalid() {
        assert!(Percentile::new(-0.1).is_err());
        assert!(Percentile::new(100.1).is_err());
        assert!(Percentile::new(f64::NAN).is_err());
        assert!(Percentile::new(f64::INFINITY).is_err());
    }

    #[test]
    fn quantile() {
        let p = Percentile::new(95.0).unwrap();
        assert_eq!(p.value(), 95.0);
        assert!((p.quantile() - 0.95).abs() < f64::EPSILON);
    }
}
