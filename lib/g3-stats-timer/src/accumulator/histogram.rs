/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use hdrhistogram::{Histogram, RecordError};

use super::{Accumulator, StatsSnapshot};
use crate::error::{ConfigError, CycleError};
use crate::quantile::Percentile;

/// An accumulator backed by a HDR histogram.
///
/// The histogram auto resizes, so there is no limit on the number of
/// samples in one window, but the statistics are only accurate to the
/// configured significant figures.
pub struct HistogramAccumulator {
    inner: Histogram<u64>,
    total: u64,
    failed: u64,
    last_error: Option<RecordError>,
    percentiles: Vec<Percentile>,
}

impl HistogramAccumulator {
    pub fn new(percentiles: &[Percentile]) -> Result<Self, ConfigError> {
        HistogramAccumulator::with_sigfig(3, percentiles)
    }

    pub fn with_sigfig(sigfig: u8, percentiles: &[Percentile]) -> Result<Self, ConfigError> {
        let mut inner = Histogram::new(sigfig).map_err(ConfigError::Histogram)?;
        inner.auto(true);
        Ok(HistogramAccumulator {
            inner,
            total: 0,
            failed: 0,
            last_error: None,
            percentiles: percentiles.to_vec(),
        })
    }

    pub fn inner(&self) -> &Histogram<u64> {
        &self.inner
    }
}

impl Accumulator for HistogramAccumulator {
    fn record(&mut self, value: u64) {
        match self.inner.record(value) {
            Ok(_) => self.total = self.total.saturating_add(value),
            Err(e) => {
                self.failed += 1;
                self.last_error = Some(e);
            }
        }
    }

    fn compute_stats(&mut self) -> Result<StatsSnapshot, CycleError> {
        if self.inner.is_empty() {
            return Ok(StatsSnapshot::empty(self.percentiles.len()));
        }

        let std_dev = self.inner.stdev();
        let percentiles = self
            .percentiles
            .iter()
            .map(|p| self.inner.value_at_quantile(p.quantile()) as f64)
            .collect();
        Ok(StatsSnapshot {
            count: self.inner.len(),
            total: self.total,
            min: self.inner.min(),
            max: self.inner.max(),
            mean: self.inner.mean(),
            variance: std_dev * std_dev,
            std_dev,
            percentiles,
        })
    }

    fn take_error(&mut self) -> Option<CycleError> {
        let last = self.last_error.take()?;
        Some(CycleError::Record {
            count: std::mem::take(&mut self.failed),
            last,
        })
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.total = 0;
        self.failed = 0;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_stats() {
        let p99 = Percentile::new(99.0).unwrap();
        let mut h = HistogramAccumulator::new(&[p99]).unwrap();
        for v in [10, 20, 30] {
            h.record(v);
        }
        let s = h.compute_stats().unwrap();
        assert_eq!(s.count(), 3);
        assert_eq!(s.total(), 60);
        assert_eq!(s.min(), 10);
        assert_eq!(s.max(), 30);
        assert_eq!(s.mean(), 20.0);
        assert_eq!(s.percentiles(), &[30.0]);
    }

    #[test]
    fn reset() {
        let mut h = HistogramAccumulator::new(&[]).unwrap();
        h.record(1000);
        h.reset();
        assert!(h.inner().is_empty());
        let s = h.compute_stats().unwrap();
        assert!(s.is_empty());
        assert_eq!(s.total(), 0);
    }

    #[test]
    fn record_error() {
        let mut inner = Histogram::new_with_bounds(1, 1000, 3).unwrap();
        inner.auto(false);
        let mut h = HistogramAccumulator {
            inner,
            total: 0,
            failed: 0,
            last_error: None,
            percentiles: Vec::new(),
        };
        h.record(10);
        h.record(5000);
        h.record(6000);
        h.record(20);

        let s = h.compute_stats().unwrap();
        assert_eq!(s.count(), 2);
        assert_eq!(s.total(), 30);
        assert_eq!(s.max(), 20);
        assert!(matches!(
            h.take_error(),
            Some(CycleError::Record { count: 2, .. })
        ));
        assert!(h.take_error().is_none());
    }

    #[test]
    fn invalid_sigfig() {
        assert!(HistogramAccumulator::with_sigfig(6, &[]).is_err());
    }
}
