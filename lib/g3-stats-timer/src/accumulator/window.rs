/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::{Accumulator, StatsSnapshot};
use crate::error::CycleError;
use crate::quantile::Percentile;

/// An exact accumulator that keeps at most `capacity` samples.
///
/// When the window is full the oldest sample is overwritten. `count`,
/// `total`, `min` and `max` cover every recorded value, while mean,
/// variance and percentiles are computed on the retained samples only.
pub struct SampleWindow {
    capacity: usize,
    values: Vec<u64>,
    sorted: Vec<u64>,
    next: usize,
    count: u64,
    total: u64,
    min: u64,
    max: u64,
    percentiles: Vec<Percentile>,
}

impl SampleWindow {
    pub fn new(capacity: usize, percentiles: &[Percentile]) -> Self {
        let capacity = capacity.max(1);
        SampleWindow {
            capacity,
            values: Vec::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
            next: 0,
            count: 0,
            total: 0,
            min: u64::MAX,
            max: 0,
            percentiles: percentiles.to_vec(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently retained.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn percentile_value(sorted: &[u64], p: Percentile) -> f64 {
        let n = sorted.len();
        let pos = p.value() * (n + 1) as f64 / 100.0;
        if pos < 1.0 {
            sorted[0] as f64
        } else if pos >= n as f64 {
            sorted[n - 1] as f64
        } else {
            let i = pos as usize;
            let lower = sorted[i - 1] as f64;
            let upper = sorted[i] as f64;
            lower + pos.fract() * (upper - lower)
        }
    }
}

impl Accumulator for SampleWindow {
    fn record(&mut self, value: u64) {
        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            self.values[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;

        self.count += 1;
        self.total = self.total.saturating_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn compute_stats(&mut self) -> Result<StatsSnapshot, CycleError> {
        if self.values.is_empty() {
            return Ok(StatsSnapshot::empty(self.percentiles.len()));
        }

        self.sorted.clear();
        self.sorted.extend_from_slice(&self.values);
        self.sorted.sort_unstable();

        let n = self.sorted.len() as f64;
        let sum: f64 = self.sorted.iter().map(|v| *v as f64).sum();
        let mean = sum / n;
        let variance = self
            .sorted
            .iter()
            .map(|v| {
                let d = *v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        let percentiles = self
            .percentiles
            .iter()
            .map(|p| Self::percentile_value(&self.sorted, *p))
            .collect();

        Ok(StatsSnapshot {
            count: self.count,
            total: self.total,
            min: self.min,
            max: self.max,
            mean,
            variance,
            std_dev: variance.sqrt(),
            percentiles,
        })
    }

    fn reset(&mut self) {
        self.values.clear();
        self.next = 0;
        self.count = 0;
        self.total = 0;
        self.min = u64::MAX;
        self.max = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percentiles(list: &[f64]) -> Vec<Percentile> {
        list.iter().map(|v| Percentile::new(*v).unwrap()).collect()
    }

    #[test]
    fn basic_stats() {
        let mut w = SampleWindow::new(100, &[]);
        for v in [10, 20, 30] {
            w.record(v);
        }
        let s = w.compute_stats().unwrap();
        assert_eq!(s.count(), 3);
        assert_eq!(s.total(), 60);
        assert_eq!(s.min(), 10);
        assert_eq!(s.max(), 30);
        assert_eq!(s.mean(), 20.0);
        assert!((s.variance() - 200.0 / 3.0).abs() < 1e-9);
        assert!((s.std_dev() - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!(s.percentiles().is_empty());
    }

    #[test]
    fn percentile_interpolation() {
        let mut w = SampleWindow::new(1000, &percentiles(&[50.0, 99.0, 0.0, 100.0]));
        for v in (1..=100).rev() {
            w.record(v);
        }
        let s = w.compute_stats().unwrap();
        let p = s.percentiles();
        assert_eq!(p.len(), 4);
        assert!((p[0] - 50.5).abs() < 1e-9);
        assert!((p[1] - 99.99).abs() < 1e-9);
        assert_eq!(p[2], 1.0);
        assert_eq!(p[3], 100.0);
    }

    #[test]
    fn single_value() {
        let mut w = SampleWindow::new(8, &percentiles(&[50.0, 99.9]));
        w.record(42);
        let s = w.compute_stats().unwrap();
        assert_eq!(s.percentiles(), &[42.0, 42.0]);
        assert_eq!(s.variance(), 0.0);
    }

    #[test]
    fn overwrite_oldest() {
        let mut w = SampleWindow::new(3, &percentiles(&[100.0]));
        for v in [1, 2, 3, 4, 5] {
            w.record(v);
        }
        assert_eq!(w.len(), 3);
        let s = w.compute_stats().unwrap();
        assert_eq!(s.count(), 5);
        assert_eq!(s.total(), 15);
        assert_eq!(s.min(), 1);
        assert_eq!(s.max(), 5);
        // retained samples are 3, 4, 5
        assert_eq!(s.mean(), 4.0);
        assert_eq!(s.percentiles(), &[5.0]);
    }

    #[test]
    fn empty_and_reset() {
        let mut w = SampleWindow::new(4, &percentiles(&[95.0, 99.0]));
        let s = w.compute_stats().unwrap();
        assert!(s.is_empty());
        assert_eq!(s, StatsSnapshot::empty(2));

        w.record(7);
        w.record(9);
        w.reset();
        assert!(w.is_empty());
        assert_eq!(w.capacity(), 4);
        let s = w.compute_stats().unwrap();
        assert_eq!(s.count(), 0);
        assert_eq!(s.min(), 0);
    }
}
