/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::warn;

use crate::error::CycleError;
use crate::metrics::MetricIdentity;

/// Called when a stats cycle of a timer failed.
pub trait CycleErrorHandler: Send + Sync {
    fn handle_cycle_error(&self, identity: &MetricIdentity, e: &CycleError);
}

/// The default handler, which only logs the error.
#[derive(Default)]
pub struct LogCycleErrorHandler;

impl CycleErrorHandler for LogCycleErrorHandler {
    fn handle_cycle_error(&self, identity: &MetricIdentity, e: &CycleError) {
        warn!("unable to compute stats for timer {identity}: {e}");
    }
}
