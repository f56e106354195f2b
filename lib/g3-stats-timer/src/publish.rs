/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;

use crate::accumulator::StatsSnapshot;
use crate::config::StatsConfig;
use crate::error::{ConfigError, CycleError};
use crate::metrics::{MetricIdentity, MetricTagName, MetricTagValue};
use crate::quantile::Percentile;
use crate::sink::{Gauge, GaugeValue, MetricValue};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Statistic {
    Min,
    Max,
    Mean,
    Variance,
    StdDev,
    Percentile { index: usize, percentile: Percentile },
}

impl Statistic {
    pub fn tag_value(&self) -> MetricTagValue {
        match self {
            Statistic::Min => MetricTagValue::new_unchecked("min"),
            Statistic::Max => MetricTagValue::new_unchecked("max"),
            Statistic::Mean => MetricTagValue::new_unchecked("avg"),
            Statistic::Variance => MetricTagValue::new_unchecked("variance"),
            Statistic::StdDev => MetricTagValue::new_unchecked("stdDev"),
            Statistic::Percentile { percentile, .. } => percentile.tag_value(),
        }
    }

    /// Get the value of this statistic from a snapshot.
    pub fn value(&self, snapshot: &StatsSnapshot) -> Result<f64, CycleError> {
        match self {
            Statistic::Min => Ok(snapshot.min() as f64),
            Statistic::Max => Ok(snapshot.max() as f64),
            Statistic::Mean => Ok(snapshot.mean()),
            Statistic::Variance => Ok(snapshot.variance()),
            Statistic::StdDev => Ok(snapshot.std_dev()),
            Statistic::Percentile { index, .. } => {
                snapshot
                    .percentile_value(*index)
                    .ok_or(CycleError::MissingPercentile {
                        index: *index,
                        len: snapshot.percentiles().len(),
                    })
            }
        }
    }

    fn publisher(self, base: &MetricIdentity) -> StatisticPublisher {
        let identity = base.with_tag(MetricTagName::STATISTIC, self.tag_value());
        // min and max are published as integers, all others as reals
        match self {
            Statistic::Min => {
                StatisticPublisher::Integer(GaugePublisher::new(self, identity, |_, s| Ok(s.min())))
            }
            Statistic::Max => {
                StatisticPublisher::Integer(GaugePublisher::new(self, identity, |_, s| Ok(s.max())))
            }
            _ => StatisticPublisher::Real(GaugePublisher::new(
                self,
                identity,
                Statistic::value,
            )),
        }
    }
}

type Extract<V> = fn(&Statistic, &StatsSnapshot) -> Result<V, CycleError>;

/// Pulls one statistic out of a snapshot into a gauge.
pub struct GaugePublisher<V: GaugeValue> {
    statistic: Statistic,
    gauge: Gauge<V>,
    extract: Extract<V>,
}

impl<V: GaugeValue> GaugePublisher<V> {
    fn new(statistic: Statistic, identity: MetricIdentity, extract: Extract<V>) -> Self {
        GaugePublisher {
            statistic,
            gauge: Gauge::new(identity),
            extract,
        }
    }

    #[inline]
    pub fn gauge(&self) -> &Gauge<V> {
        &self.gauge
    }

    fn publish(&self, snapshot: &StatsSnapshot) -> Result<(), CycleError> {
        let v = (self.extract)(&self.statistic, snapshot)?;
        self.gauge.set(v);
        Ok(())
    }
}

pub enum StatisticPublisher {
    Integer(GaugePublisher<u64>),
    Real(GaugePublisher<f64>),
}

impl StatisticPublisher {
    pub fn statistic(&self) -> Statistic {
        match self {
            StatisticPublisher::Integer(p) => p.statistic,
            StatisticPublisher::Real(p) => p.statistic,
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        match self {
            StatisticPublisher::Integer(p) => p.gauge.identity(),
            StatisticPublisher::Real(p) => p.gauge.identity(),
        }
    }

    pub fn value(&self) -> MetricValue {
        match self {
            StatisticPublisher::Integer(p) => p.gauge.value().metric_value(),
            StatisticPublisher::Real(p) => p.gauge.value().metric_value(),
        }
    }

    pub fn publish(&self, snapshot: &StatsSnapshot) -> Result<(), CycleError> {
        match self {
            StatisticPublisher::Integer(p) => p.publish(snapshot),
            StatisticPublisher::Real(p) => p.publish(snapshot),
        }
    }
}

pub(crate) fn validate_percentiles(list: &[f64]) -> Result<Vec<Percentile>, ConfigError> {
    list.iter().map(|v| Percentile::new(*v)).collect()
}

/// Build all statistic publishers enabled in the config.
///
/// The percentile publishers keep the index of their percentile in the
/// configured list, which should also be the order of the percentile values
/// computed by the accumulator.
pub fn build_publishers(
    config: &StatsConfig,
    base: &MetricIdentity,
) -> Result<Vec<StatisticPublisher>, ConfigError> {
    let flags = [
        (config.publish_max(), Statistic::Max),
        (config.publish_min(), Statistic::Min),
        (config.publish_variance(), Statistic::Variance),
        (config.publish_std_dev(), Statistic::StdDev),
        (config.publish_mean(), Statistic::Mean),
    ];

    let mut publishers = Vec::with_capacity(flags.len() + config.percentiles().len());
    for (enabled, statistic) in flags {
        if enabled {
            publishers.push(statistic.publisher(base));
        }
    }

    let percentiles = validate_percentiles(config.percentiles())?;
    for (index, percentile) in percentiles.into_iter().enumerate() {
        publishers.push(Statistic::Percentile { index, percentile }.publisher(base));
    }

    check_duplicate(publishers.iter().map(|p| p.identity()))?;
    Ok(publishers)
}

pub(crate) fn check_duplicate<'a, I>(identities: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = &'a MetricIdentity>,
{
    let mut seen = HashSet::new();
    for identity in identities {
        if !seen.insert(identity) {
            return Err(ConfigError::DuplicateIdentity(identity.clone()));
        }
    }
    Ok(())
}
