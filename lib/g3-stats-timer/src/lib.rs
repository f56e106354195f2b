/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod metrics;

mod error;
pub use error::{ConfigError, CycleError};

mod unit;
pub use unit::TimeUnit;

mod quantile;
pub use quantile::Percentile;

pub mod accumulator;
pub use accumulator::{Accumulator, StatsSnapshot};

pub mod sink;

mod publish;
pub use publish::{GaugePublisher, Statistic, StatisticPublisher, build_publishers};

mod buffer;
pub use buffer::DoubleBuffer;

mod handler;
pub use handler::{CycleErrorHandler, LogCycleErrorHandler};

mod scheduler;
pub use scheduler::StatsScheduler;

mod config;
pub use config::{AccumulatorKind, StatsConfig};

mod timer;
pub use timer::{StatsTimer, StatsTimerBuilder, Stopwatch};

#[cfg(feature = "yaml")]
pub mod yaml;
