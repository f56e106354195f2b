/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::accumulator::{Accumulator, StatsSnapshot};
use crate::buffer::DoubleBuffer;
use crate::config::StatsConfig;
use crate::error::{ConfigError, CycleError};
use crate::handler::{CycleErrorHandler, LogCycleErrorHandler};
use crate::metrics::{MetricIdentity, MetricName, MetricTagMap, MetricTagName, MetricTagValue};
use crate::publish::{StatisticPublisher, build_publishers, check_duplicate, validate_percentiles};
use crate::scheduler::{CycleTask, StatsScheduler};
use crate::sink::{Counter, MetricValue};
use crate::unit::TimeUnit;

pub struct StatsTimerBuilder {
    name: MetricName,
    tags: MetricTagMap,
    unit: TimeUnit,
    config: StatsConfig,
    scheduler: Option<StatsScheduler>,
    handler: Arc<dyn CycleErrorHandler>,
    accumulators: Option<(Box<dyn Accumulator>, Box<dyn Accumulator>)>,
    spawn_cycle: bool,
}

impl StatsTimerBuilder {
    pub fn new(name: MetricName, config: StatsConfig) -> Self {
        StatsTimerBuilder {
            name,
            tags: MetricTagMap::default(),
            unit: TimeUnit::default(),
            config,
            scheduler: None,
            handler: Arc::new(LogCycleErrorHandler),
            accumulators: None,
            spawn_cycle: true,
        }
    }

    pub fn tags(mut self, tags: MetricTagMap) -> Self {
        self.tags = tags;
        self
    }

    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Run the stats cycle on this scheduler instead of the global one.
    pub fn scheduler(mut self, scheduler: StatsScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn error_handler(mut self, handler: Arc<dyn CycleErrorHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Use custom accumulators instead of the ones set in config.
    ///
    /// They should compute the percentiles in the same order as the
    /// percentile list in config.
    pub fn accumulators(
        mut self,
        active: Box<dyn Accumulator>,
        standby: Box<dyn Accumulator>,
    ) -> Self {
        self.accumulators = Some((active, standby));
        self
    }

    /// Do not spawn the periodic task, the caller should call
    /// [`StatsTimer::run_cycle`] itself.
    pub fn manual_cycle(mut self) -> Self {
        self.spawn_cycle = false;
        self
    }

    pub fn build(self) -> Result<StatsTimer, ConfigError> {
        self.config.check()?;
        let percentiles = validate_percentiles(self.config.percentiles())?;

        let identity = MetricIdentity::with_tags(self.name, self.tags).with_tag(
            MetricTagName::UNIT,
            MetricTagValue::new_unchecked(self.unit.as_str()),
        );
        let count = Counter::new(identity.with_tag(
            MetricTagName::STATISTIC,
            MetricTagValue::new_unchecked("count"),
        ));
        let total_time = Counter::new(identity.with_tag(
            MetricTagName::STATISTIC,
            MetricTagValue::new_unchecked("totalTime"),
        ));
        let publishers = build_publishers(&self.config, &identity)?;

        let (active, standby) = match self.accumulators {
            Some(pair) => pair,
            None => (
                self.config.new_accumulator(&percentiles)?,
                self.config.new_accumulator(&percentiles)?,
            ),
        };

        let core = Arc::new(TimerCore {
            identity,
            unit: self.unit,
            publish_count: self.config.publish_count(),
            publish_total: self.config.publish_total(),
            count,
            total_time,
            publishers,
            buffer: DoubleBuffer::new(active, standby),
            handler: self.handler,
        });
        check_duplicate(
            core.published_counters()
                .map(|c| c.identity())
                .chain(core.publishers.iter().map(|p| p.identity())),
        )?;

        let task = if self.spawn_cycle {
            let scheduler = match self.scheduler {
                Some(scheduler) => scheduler,
                None => StatsScheduler::global().map_err(ConfigError::SchedulerUnavailable)?,
            };
            let weak_core = Arc::downgrade(&core);
            let task = scheduler.spawn_periodic(self.config.frequency(), move || {
                match weak_core.upgrade() {
                    Some(core) => {
                        let _ = core.run_cycle();
                        true
                    }
                    None => false,
                }
            });
            Some(task)
        } else {
            None
        };

        Ok(StatsTimer {
            core,
            task: Mutex::new(task),
        })
    }
}

struct TimerCore {
    identity: MetricIdentity,
    unit: TimeUnit,
    publish_count: bool,
    publish_total: bool,
    count: Counter,
    total_time: Counter,
    publishers: Vec<StatisticPublisher>,
    buffer: DoubleBuffer<dyn Accumulator>,
    handler: Arc<dyn CycleErrorHandler>,
}

impl TimerCore {
    fn published_counters(&self) -> impl Iterator<Item = &Counter> {
        let count = self.publish_count.then_some(&self.count);
        let total_time = self.publish_total.then_some(&self.total_time);
        count.into_iter().chain(total_time)
    }

    fn run_cycle(&self) -> Result<StatsSnapshot, CycleError> {
        let r = panic::catch_unwind(AssertUnwindSafe(|| self.buffer.run_cycle(&self.publishers)))
            .unwrap_or_else(|payload| Err(CycleError::Compute(panic_message(payload.as_ref()))));
        if let Err(e) = &r {
            self.handler.handle_cycle_error(&self.identity, e);
        }
        r
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// A timer that publishes statistics of the recorded durations.
///
/// Durations are recorded from any thread. The count and total time are
/// kept for the lifetime of the timer, while the other statistics are
/// computed periodically on the values recorded since the previous cycle.
pub struct StatsTimer {
    core: Arc<TimerCore>,
    task: Mutex<Option<CycleTask>>,
}

impl StatsTimer {
    #[inline]
    pub fn identity(&self) -> &MetricIdentity {
        &self.core.identity
    }

    #[inline]
    pub fn time_unit(&self) -> TimeUnit {
        self.core.unit
    }

    pub fn start(&self) -> Stopwatch<'_> {
        Stopwatch {
            timer: self,
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Record a duration in the unit of this timer.
    pub fn record(&self, duration: u64) {
        self.core.buffer.record(duration);
        self.core.count.increment();
        self.core.total_time.increment_by(duration);
    }

    pub fn record_with_unit(&self, duration: u64, unit: TimeUnit) {
        self.record(self.core.unit.convert(duration, unit));
    }

    pub fn record_duration(&self, duration: Duration) {
        self.record(self.core.unit.convert_duration(duration));
    }

    /// The mean duration over the lifetime of the timer.
    pub fn value(&self) -> u64 {
        let n = self.count();
        if n > 0 { self.total_time() / n } else { 0 }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.core.count.value()
    }

    #[inline]
    pub fn total_time(&self) -> u64 {
        self.core.total_time.value()
    }

    #[inline]
    pub fn publishers(&self) -> &[StatisticPublisher] {
        &self.core.publishers
    }

    /// Visit all the published metrics, the counters first.
    pub fn foreach_metric<F>(&self, mut call: F)
    where
        F: FnMut(&MetricIdentity, MetricValue),
    {
        for c in self.core.published_counters() {
            call(c.identity(), MetricValue::Integer(c.value()));
        }
        for p in &self.core.publishers {
            call(p.identity(), p.value());
        }
    }

    /// Run one stats cycle in the current thread.
    ///
    /// This is what the periodic task does. Errors are also passed to the
    /// error handler, and a panic of the accumulator is returned as
    /// [`CycleError::Compute`].
    pub fn run_cycle(&self) -> Result<StatsSnapshot, CycleError> {
        self.core.run_cycle()
    }

    /// Cancel the periodic stats task. Recording is still allowed, but the
    /// statistics gauges will no longer be updated by the scheduler.
    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap();
        if let Some(mut task) = task.take() {
            task.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        let task = self.task.lock().unwrap();
        task.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

/// Measures the time until [`Stopwatch::stop`] is called or it is dropped,
/// and records it to the timer.
pub struct Stopwatch<'a> {
    timer: &'a StatsTimer,
    start: Instant,
    stopped: bool,
}

impl Stopwatch<'_> {
    pub fn duration(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop and record, the recorded value in the unit of the timer is returned.
    pub fn stop(mut self) -> u64 {
        self.stopped = true;
        self.record()
    }

    fn record(&self) -> u64 {
        let v = self.timer.time_unit().convert_duration(self.start.elapsed());
        self.timer.record(v);
        v
    }
}

impl Drop for Stopwatch<'_> {
    fn drop(&mut self) {
        if !self.stopped {
            self.record();
        }
    }
}
