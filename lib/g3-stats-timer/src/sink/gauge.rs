/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

use portable_atomic::AtomicF64;

use super::MetricValue;
use crate::metrics::MetricIdentity;

/// Numeric types that can be stored in a [`Gauge`].
pub trait GaugeValue: Copy + Send + Sync + 'static {
    type Atomic: Send + Sync;

    const ZERO: Self;

    fn new_atomic(v: Self) -> Self::Atomic;
    fn load(atomic: &Self::Atomic) -> Self;
    fn store(atomic: &Self::Atomic, v: Self);
    fn metric_value(self) -> MetricValue;
}

impl GaugeValue for u64 {
    type Atomic = AtomicU64;

    const ZERO: Self = 0;

    fn new_atomic(v: Self) -> Self::Atomic {
        AtomicU64::new(v)
    }

    fn load(atomic: &Self::Atomic) -> Self {
        atomic.load(Ordering::Relaxed)
    }

    fn store(atomic: &Self::Atomic, v: Self) {
        atomic.store(v, Ordering::Relaxed)
    }

    fn metric_value(self) -> MetricValue {
        MetricValue::Integer(self)
    }
}

impl GaugeValue for f64 {
    type Atomic = AtomicF64;

    const ZERO: Self = 0.0;

    fn new_atomic(v: Self) -> Self::Atomic {
        AtomicF64::new(v)
    }

    fn load(atomic: &Self::Atomic) -> Self {
        atomic.load(Ordering::Relaxed)
    }

    fn store(atomic: &Self::Atomic, v: Self) {
        atomic.store(v, Ordering::Relaxed)
    }

    fn metric_value(self) -> MetricValue {
        MetricValue::Real(self)
    }
}

/// A gauge holding the last value set.
pub struct Gauge<V: GaugeValue> {
    identity: MetricIdentity,
    value: V::Atomic,
}

impl<V: GaugeValue> Gauge<V> {
    pub fn new(identity: MetricIdentity) -> Self {
        Gauge {
            identity,
            value: V::new_atomic(V::ZERO),
        }
    }

    #[inline]
    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    #[inline]
    pub fn set(&self, v: V) {
        V::store(&self.value, v);
    }

    #[inline]
    pub fn value(&self) -> V {
        V::load(&self.value)
    }
}
