/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

/// Statistics computed from one accumulator window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    pub(crate) count: u64,
    pub(crate) total: u64,
    pub(crate) min: u64,
    pub(crate) max: u64,
    pub(crate) mean: f64,
    pub(crate) variance: f64,
    pub(crate) std_dev: f64,
    pub(crate) percentiles: Vec<f64>,
}

impl StatsSnapshot {
    /// The snapshot of a window without any value recorded.
    pub fn empty(percentile_count: usize) -> Self {
        StatsSnapshot {
            percentiles: vec![0.0; percentile_count],
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn min(&self) -> u64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> u64 {
        self.max
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[inline]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    #[inline]
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    #[inline]
    pub fn percentile_value(&self, index: usize) -> Option<f64> {
        self.percentiles.get(index).copied()
    }
}
