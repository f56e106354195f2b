/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use crate::accumulator::{Accumulator, HistogramAccumulator, SampleWindow};
use crate::error::ConfigError;
use crate::quantile::Percentile;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccumulatorKind {
    /// Exact stats on a bounded window of the latest samples.
    #[default]
    Window,
    /// Approximate stats on all samples, see [`HistogramAccumulator`].
    Histogram,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatsConfig {
    sample_size: usize,
    percentiles: Vec<f64>,
    frequency: Duration,
    accumulator: AccumulatorKind,
    publish_count: bool,
    publish_total: bool,
    publish_min: bool,
    publish_max: bool,
    publish_mean: bool,
    publish_variance: bool,
    publish_std_dev: bool,
}

impl StatsConfig {
    pub fn with_frequency(frequency: Duration) -> Self {
        StatsConfig {
            sample_size: 1000,
            percentiles: vec![95.0, 99.0],
            frequency,
            accumulator: AccumulatorKind::default(),
            publish_count: true,
            publish_total: true,
            publish_min: false,
            publish_max: false,
            publish_mean: false,
            publish_variance: false,
            publish_std_dev: false,
        }
    }

    #[inline]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    #[inline]
    pub fn set_sample_size(&mut self, size: usize) {
        self.sample_size = size;
    }

    #[inline]
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    /// Set the percentiles to publish, in range [0, 100].
    /// The order is kept in the published metrics.
    #[inline]
    pub fn set_percentiles(&mut self, list: Vec<f64>) {
        self.percentiles = list;
    }

    #[inline]
    pub fn frequency(&self) -> Duration {
        self.frequency
    }

    #[inline]
    pub fn set_frequency(&mut self, frequency: Duration) {
        self.frequency = frequency;
    }

    #[inline]
    pub fn accumulator(&self) -> AccumulatorKind {
        self.accumulator
    }

    #[inline]
    pub fn set_accumulator(&mut self, kind: AccumulatorKind) {
        self.accumulator = kind;
    }

    #[inline]
    pub fn publish_count(&self) -> bool {
        self.publish_count
    }

    #[inline]
    pub fn set_publish_count(&mut self, enable: bool) {
        self.publish_count = enable;
    }

    #[inline]
    pub fn publish_total(&self) -> bool {
        self.publish_total
    }

    #[inline]
    pub fn set_publish_total(&mut self, enable: bool) {
        self.publish_total = enable;
    }

    #[inline]
    pub fn publish_min(&self) -> bool {
        self.publish_min
    }

    #[inline]
    pub fn set_publish_min(&mut self, enable: bool) {
        self.publish_min = enable;
    }

    #[inline]
    pub fn publish_max(&self) -> bool {
        self.publish_max
    }

    #[inline]
    pub fn set_publish_max(&mut self, enable: bool) {
        self.publish_max = enable;
    }

    #[inline]
    pub fn publish_mean(&self) -> bool {
        self.publish_mean
    }

    #[inline]
    pub fn set_publish_mean(&mut self, enable: bool) {
        self.publish_mean = enable;
    }

    #[inline]
    pub fn publish_variance(&self) -> bool {
        self.publish_variance
    }

    #[inline]
    pub fn set_publish_variance(&mut self, enable: bool) {
        self.publish_variance = enable;
    }

    #[inline]
    pub fn publish_std_dev(&self) -> bool {
        self.publish_std_dev
    }

    #[inline]
    pub fn set_publish_std_dev(&mut self, enable: bool) {
        self.publish_std_dev = enable;
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.sample_size == 0 {
            return Err(ConfigError::InvalidSampleSize);
        }
        if self.frequency.is_zero() {
            return Err(ConfigError::InvalidFrequency);
        }
        for v in &self.percentiles {
            Percentile::new(*v)?;
        }
        Ok(())
    }

    pub(crate) fn new_accumulator(
        &self,
        percentiles: &[Percentile],
    ) -> Result<Box<dyn Accumulator>, ConfigError> {
        match self.accumulator {
            AccumulatorKind::Window => Ok(Box::new(SampleWindow::new(
                self.sample_size,
                percentiles,
            ))),
            AccumulatorKind::Histogram => Ok(Box::new(HistogramAccumulator::new(percentiles)?)),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig::with_frequency(Duration::from_secs(60))
    }
}
