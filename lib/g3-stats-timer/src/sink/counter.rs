/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::MetricIdentity;

/// A monotonic counter, which stays at `u64::MAX` once reached.
pub struct Counter {
    identity: MetricIdentity,
    value: AtomicU64,
}

impl Counter {
    pub fn new(identity: MetricIdentity) -> Self {
        Counter {
            identity,
            value: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    #[inline]
    pub fn increment(&self) {
        self.increment_by(1);
    }

    pub fn increment_by(&self, amount: u64) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_add(amount))
            });
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
