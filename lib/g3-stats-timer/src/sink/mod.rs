/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod counter;
pub use counter::Counter;

mod gauge;
pub use gauge::{Gauge, GaugeValue};

/// Current value of one published metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricValue {
    Integer(u64),
    Real(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Integer(v) => *v as f64,
            MetricValue::Real(v) => *v,
        }
    }
}
