/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }

    const fn nanos(&self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60_000_000_000,
            TimeUnit::Hours => 3_600_000_000_000,
            TimeUnit::Days => 86_400_000_000_000,
        }
    }

    /// Convert `value` in unit `from` to this unit.
    ///
    /// Conversion to a coarser unit truncates, conversion to a finer unit
    /// saturates at `u64::MAX`.
    pub fn convert(&self, value: u64, from: TimeUnit) -> u64 {
        let src = from.nanos();
        let dst = self.nanos();
        if src >= dst {
            value.saturating_mul(src / dst)
        } else {
            value / (dst / src)
        }
    }

    pub fn convert_duration(&self, dur: Duration) -> u64 {
        let v = dur.as_nanos() / self.nanos() as u128;
        u64::try_from(v).unwrap_or(u64::MAX)
    }
}
