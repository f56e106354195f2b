/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::error::CycleError;

mod snapshot;
pub use snapshot::StatsSnapshot;

mod window;
pub use window::SampleWindow;

mod histogram;
pub use histogram::HistogramAccumulator;

/// A buffer of recorded values for one stats window.
///
/// The percentile values in the computed snapshot should be in the same
/// order as the percentile list the accumulator was created with.
pub trait Accumulator: Send {
    fn record(&mut self, value: u64);

    fn compute_stats(&mut self) -> Result<StatsSnapshot, CycleError>;

    /// Take the error met while recording values of this window, if any.
    ///
    /// It is reported after the stats of the values recorded successfully
    /// have been published.
    fn take_error(&mut self) -> Option<CycleError> {
        None
    }

    /// Drop all recorded values, the accumulator will be reused for the
    /// next window.
    fn reset(&mut self);
}
