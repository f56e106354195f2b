/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::{Mutex, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};

static GLOBAL_SCHEDULER: Mutex<Option<StatsScheduler>> = Mutex::new(None);
static GLOBAL_QUIT_SENDER: Mutex<Option<oneshot::Sender<()>>> = Mutex::new(None);
static GLOBAL_JOIN_HANDLE: Mutex<Option<JoinHandle<()>>> = Mutex::new(None);

/// The runtime where the periodic stats tasks run.
///
/// A process wide scheduler will be started on first use of
/// [`StatsScheduler::global`]. It runs a current thread runtime in a
/// dedicated thread named `stats-timer`, and lives until
/// [`StatsScheduler::close_global`] is called.
#[derive(Clone)]
pub struct StatsScheduler {
    handle: Handle,
}

impl StatsScheduler {
    /// Use the given runtime, which should have the time driver enabled.
    pub fn new(handle: Handle) -> Self {
        StatsScheduler { handle }
    }

    /// Use the runtime of the current context.
    ///
    /// # Panics
    ///
    /// This will panic if called outside the context of a tokio runtime.
    pub fn current() -> Self {
        StatsScheduler::new(Handle::current())
    }

    pub fn global() -> io::Result<Self> {
        let mut lock = GLOBAL_SCHEDULER.lock().unwrap();
        if let Some(scheduler) = lock.as_ref() {
            return Ok(scheduler.clone());
        }

        let (quit_sender, quit_receiver) = oneshot::channel::<()>();
        let (handle_sender, handle_receiver) = mpsc::sync_channel(1);
        let join_handle = std::thread::Builder::new()
            .name("stats-timer".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = handle_sender.send(Err(e));
                        return;
                    }
                };

                if handle_sender.send(Ok(rt.handle().clone())).is_ok() {
                    let _ = rt.block_on(quit_receiver);
                }
            })?;

        let handle = handle_receiver
            .recv()
            .map_err(|_| io::Error::other("stats scheduler thread exited unexpectedly"))??;
        debug!("global stats scheduler started");

        let scheduler = StatsScheduler::new(handle);
        *lock = Some(scheduler.clone());
        *GLOBAL_QUIT_SENDER.lock().unwrap() = Some(quit_sender);
        *GLOBAL_JOIN_HANDLE.lock().unwrap() = Some(join_handle);
        Ok(scheduler)
    }

    /// Stop the global scheduler thread. Tasks spawned on it will be dropped.
    pub fn close_global() {
        let mut lock = GLOBAL_SCHEDULER.lock().unwrap();
        lock.take();

        if let Some(sender) = GLOBAL_QUIT_SENDER.lock().unwrap().take() {
            let _ = sender.send(());
        }
        if let Some(join_handle) = GLOBAL_JOIN_HANDLE.lock().unwrap().take() {
            let _ = join_handle.join();
        }
        debug!("global stats scheduler closed");
    }

    #[inline]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawn a task that calls `cycle` every `period`, starting one period
    /// later. Calls never overlap, and an overrunning call delays the next
    /// one. The task ends when `cycle` returns false or the returned
    /// [`CycleTask`] is cancelled or dropped.
    pub(crate) fn spawn_periodic<F>(&self, period: Duration, mut cycle: F) -> CycleTask
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (quit_sender, mut quit_receiver) = oneshot::channel::<()>();
        let start = Instant::now() + period;
        self.handle.spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = &mut quit_receiver => break,
                    _ = interval.tick() => {
                        if !cycle() {
                            break;
                        }
                    }
                }
            }
        });
        CycleTask {
            quit_sender: Some(quit_sender),
        }
    }
}

/// Handle of a periodic task. The task is cancelled when this is dropped.
pub(crate) struct CycleTask {
    quit_sender: Option<oneshot::Sender<()>>,
}

impl CycleTask {
    pub(crate) fn cancel(&mut self) {
        if let Some(sender) = self.quit_sender.take() {
            let _ = sender.send(());
        }
    }

    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.quit_sender.is_none()
    }
}

impl Drop for CycleTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
