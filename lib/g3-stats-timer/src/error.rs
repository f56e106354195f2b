/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use crate::metrics::{MetricIdentity, ParseError};

/// Errors detected while building a timer. All of them are fatal to the
/// construction of the instrument.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicated metric configuration found: {0}")]
    DuplicateIdentity(MetricIdentity),
    #[error("invalid percentile value {0}, should be in range [0, 100]")]
    InvalidPercentile(f64),
    #[error("sample size should be greater than zero")]
    InvalidSampleSize,
    #[error("recompute frequency should be greater than zero")]
    InvalidFrequency,
    #[error("invalid metric name: {0}")]
    InvalidMetricName(#[from] ParseError),
    #[error("failed to create histogram: {0:?}")]
    Histogram(hdrhistogram::CreationError),
    #[error("no stats scheduler available: {0}")]
    SchedulerUnavailable(io::Error),
}

/// Errors raised inside one recompute cycle. They never reach the
/// threads that record values.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("{count} value(s) failed to be recorded, last error: {last:?}")]
    Record {
        count: u64,
        last: hdrhistogram::RecordError,
    },
    #[error("no percentile value at index {index}, only {len} computed")]
    MissingPercentile { index: usize, len: usize },
    #[error("failed to compute stats: {0}")]
    Compute(String),
}
