/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use g3_stats_timer::metrics::MetricName;
use g3_stats_timer::{StatsConfig, StatsScheduler, StatsTimerBuilder};

#[test]
fn default_scheduler() {
    let mut config = StatsConfig::with_frequency(Duration::from_millis(20));
    config.set_publish_max(true);
    let timer = StatsTimerBuilder::new(MetricName::from_str("bg").unwrap(), config)
        .build()
        .unwrap();
    assert!(timer.is_running());

    timer.record(12);
    let mut max = 0.0;
    for _ in 0..100 {
        std::thread::sleep(Duration::from_millis(20));
        max = timer.publishers()[0].value().as_f64();
        if max > 0.0 {
            break;
        }
    }
    assert_eq!(max, 12.0);

    drop(timer);
    StatsScheduler::close_global();

    // a new one is started on demand
    let scheduler = StatsScheduler::global().unwrap();
    let (sender, receiver) = std::sync::mpsc::channel();
    scheduler.handle().spawn(async move {
        let _ = sender.send(());
    });
    assert!(receiver.recv_timeout(Duration::from_secs(5)).is_ok());
    StatsScheduler::close_global();
}
