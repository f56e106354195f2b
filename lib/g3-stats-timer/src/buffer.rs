/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::accumulator::{Accumulator, StatsSnapshot};
use crate::error::CycleError;
use crate::publish::StatisticPublisher;

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Two accumulators swapped on each stats cycle.
///
/// Values are always recorded to the active one. A cycle exchanges the two
/// boxes under the active lock, then computes and resets the old active one
/// with only the standby lock held, so recording is never blocked by the
/// stats computation.
pub struct DoubleBuffer<A: ?Sized> {
    active: Mutex<Box<A>>,
    standby: Mutex<Box<A>>,
}

impl<A: Accumulator + ?Sized> DoubleBuffer<A> {
    pub fn new(active: Box<A>, standby: Box<A>) -> Self {
        DoubleBuffer {
            active: Mutex::new(active),
            standby: Mutex::new(standby),
        }
    }

    pub fn record(&self, value: u64) {
        lock(&self.active).record(value);
    }

    /// Run one stats cycle and update all the publishers.
    ///
    /// The drained accumulator is reset even if the computation or any of
    /// the publishers failed, or if the accumulator panicked. All publishers
    /// are updated even if some of them failed, and the first error is
    /// returned. Errors met while recording are returned after the stats
    /// of the recorded values have been published.
    pub fn run_cycle(
        &self,
        publishers: &[StatisticPublisher],
    ) -> Result<StatsSnapshot, CycleError> {
        let mut drained = ResetOnDrop(lock(&self.standby));
        {
            let mut active = lock(&self.active);
            std::mem::swap(&mut *active, &mut *drained.0);
        }

        let snapshot = drained.0.compute_stats()?;
        let mut first_err = drained.0.take_error();
        for p in publishers {
            if let Err(e) = p.publish(&snapshot) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }
}

/// Resets the drained accumulator when the cycle ends, including on unwind.
struct ResetOnDrop<'a, A: Accumulator + ?Sized>(MutexGuard<'a, Box<A>>);

impl<A: Accumulator + ?Sized> Drop for ResetOnDrop<'_, A> {
    fn drop(&mut self) {
        self.0.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::accumulator::SampleWindow;
    use crate::config::StatsConfig;
    use crate::metrics::{MetricIdentity, MetricName};
    use crate::publish::build_publishers;

    fn window_buffer(capacity: usize) -> DoubleBuffer<SampleWindow> {
        DoubleBuffer::new(
            Box::new(SampleWindow::new(capacity, &[])),
            Box::new(SampleWindow::new(capacity, &[])),
        )
    }

    #[test]
    fn swap_boundary() {
        let buffer = window_buffer(16);
        buffer.record(1);
        buffer.record(2);
        let s = buffer.run_cycle(&[]).unwrap();
        assert_eq!(s.count(), 2);
        assert_eq!(s.total(), 3);

        buffer.record(10);
        let s = buffer.run_cycle(&[]).unwrap();
        assert_eq!(s.count(), 1);
        assert_eq!(s.total(), 10);

        let s = buffer.run_cycle(&[]).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn concurrent_record() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 1000;

        let buffer = Arc::new(window_buffer((THREADS * PER_THREAD) as usize));
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        buffer.record(t * PER_THREAD + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let n = THREADS * PER_THREAD;
        let s = buffer.run_cycle(&[]).unwrap();
        assert_eq!(s.count(), n);
        assert_eq!(s.total(), n * (n - 1) / 2);
        assert_eq!(s.min(), 0);
        assert_eq!(s.max(), n - 1);
    }

    #[test]
    fn record_during_cycles() {
        let buffer = Arc::new(window_buffer(1 << 17));
        let done = Arc::new(AtomicBool::new(false));

        let producer = {
            let buffer = Arc::clone(&buffer);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                for _ in 0..100_000 {
                    buffer.record(1);
                }
                done.store(true, Ordering::Release);
            })
        };

        let mut seen = 0;
        while !done.load(Ordering::Acquire) {
            seen += buffer.run_cycle(&[]).unwrap().count();
        }
        producer.join().unwrap();
        seen += buffer.run_cycle(&[]).unwrap().count();
        assert_eq!(seen, 100_000);
    }

    struct FailingWindow {
        inner: SampleWindow,
        resets: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl Accumulator for FailingWindow {
        fn record(&mut self, value: u64) {
            self.inner.record(value);
        }

        fn compute_stats(&mut self) -> Result<StatsSnapshot, CycleError> {
            if self.inner.is_empty() {
                self.inner.compute_stats()
            } else {
                Err(CycleError::Compute("broken".to_string()))
            }
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::Relaxed);
            self.inner.reset();
        }
    }

    #[test]
    fn reset_after_failure() {
        let resets = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let new_window = || {
            Box::new(FailingWindow {
                inner: SampleWindow::new(4, &[]),
                resets: Arc::clone(&resets),
            }) as Box<dyn Accumulator>
        };
        let buffer: DoubleBuffer<dyn Accumulator> = DoubleBuffer::new(new_window(), new_window());

        buffer.record(5);
        assert!(matches!(
            buffer.run_cycle(&[]),
            Err(CycleError::Compute(_))
        ));
        assert_eq!(resets.load(Ordering::Relaxed), 1);

        // the failed window has been cleared before being reused
        assert!(buffer.run_cycle(&[]).unwrap().is_empty());
        assert!(buffer.run_cycle(&[]).unwrap().is_empty());
        assert_eq!(resets.load(Ordering::Relaxed), 3);
    }

    struct PanicOnce {
        inner: SampleWindow,
        panicked: Arc<AtomicBool>,
    }

    impl Accumulator for PanicOnce {
        fn record(&mut self, value: u64) {
            self.inner.record(value);
        }

        fn compute_stats(&mut self) -> Result<StatsSnapshot, CycleError> {
            if !self.inner.is_empty() && !self.panicked.swap(true, Ordering::Relaxed) {
                panic!("broken window");
            }
            self.inner.compute_stats()
        }

        fn reset(&mut self) {
            self.inner.reset();
        }
    }

    #[test]
    fn reset_after_panic() {
        let panicked = Arc::new(AtomicBool::new(false));
        let new_window = || {
            Box::new(PanicOnce {
                inner: SampleWindow::new(4, &[]),
                panicked: Arc::clone(&panicked),
            }) as Box<dyn Accumulator>
        };
        let buffer: DoubleBuffer<dyn Accumulator> = DoubleBuffer::new(new_window(), new_window());

        buffer.record(1000);
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| buffer.run_cycle(&[])));
        assert!(r.is_err());

        buffer.record(1);
        let s = buffer.run_cycle(&[]).unwrap();
        assert_eq!(s.count(), 1);
        assert_eq!(s.max(), 1);

        // the window drained by the panicked cycle is in use again
        buffer.record(2);
        let s = buffer.run_cycle(&[]).unwrap();
        assert_eq!(s.count(), 1);
        assert_eq!(s.max(), 2);
    }

    #[test]
    fn publish_after_swap() {
        let mut config = StatsConfig::default();
        config.set_publish_max(true);
        config.set_percentiles(vec![50.0]);
        let base = MetricIdentity::new(MetricName::from_str("t").unwrap());
        let publishers = build_publishers(&config, &base).unwrap();

        // the window is built without percentile, so the publisher fails
        let buffer = window_buffer(4);
        buffer.record(3);
        assert!(matches!(
            buffer.run_cycle(&publishers),
            Err(CycleError::MissingPercentile { index: 0, len: 0 })
        ));
        // max is still updated
        assert_eq!(publishers[0].value().as_f64(), 3.0);
    }

    struct LossyWindow {
        inner: SampleWindow,
        dropped: u64,
    }

    impl Accumulator for LossyWindow {
        fn record(&mut self, value: u64) {
            if value > 100 {
                self.dropped += 1;
            } else {
                self.inner.record(value);
            }
        }

        fn compute_stats(&mut self) -> Result<StatsSnapshot, CycleError> {
            self.inner.compute_stats()
        }

        fn take_error(&mut self) -> Option<CycleError> {
            (self.dropped > 0).then(|| CycleError::Compute(format!("{} dropped", self.dropped)))
        }

        fn reset(&mut self) {
            self.dropped = 0;
            self.inner.reset();
        }
    }

    #[test]
    fn publish_before_record_error() {
        let mut config = StatsConfig::default();
        config.set_publish_max(true);
        config.set_percentiles(Vec::new());
        let base = MetricIdentity::new(MetricName::from_str("t").unwrap());
        let publishers = build_publishers(&config, &base).unwrap();

        let new_window = || {
            Box::new(LossyWindow {
                inner: SampleWindow::new(4, &[]),
                dropped: 0,
            }) as Box<dyn Accumulator>
        };
        let buffer: DoubleBuffer<dyn Accumulator> = DoubleBuffer::new(new_window(), new_window());
        buffer.record(7);
        buffer.record(1000);
        assert!(matches!(buffer.run_cycle(&publishers), Err(CycleError::Compute(_))));
        assert_eq!(publishers[0].value().as_f64(), 7.0);

        buffer.record(8);
        assert_eq!(buffer.run_cycle(&publishers).unwrap().max(), 8);
    }
}
