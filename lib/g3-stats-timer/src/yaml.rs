/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::Yaml;

use crate::config::{AccumulatorKind, StatsConfig};
use crate::quantile::Percentile;

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

fn as_flag(v: &Yaml) -> anyhow::Result<bool> {
    let flag = match v {
        Yaml::Boolean(b) => Some(*b),
        Yaml::Integer(i) => Some(*i != 0),
        Yaml::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "on" => Some(true),
            "false" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    flag.ok_or_else(|| anyhow!("publish flag should be a boolean value"))
}

fn as_sample_size(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        Yaml::String(s) => Ok(usize::from_str(s)?),
        _ => Err(anyhow!("sample size should be an integer")),
    }
}

/// A humanize duration, or the number of seconds.
fn as_frequency(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::Integer(i) => Ok(Duration::from_secs(u64::try_from(*i)?)),
        Yaml::String(s) => match humanize_rs::duration::parse(s) {
            Ok(d) => Ok(d),
            Err(ParseError::MissingUnit) => Ok(Duration::from_secs(u64::from_str(s)?)),
            Err(e) => Err(anyhow!("invalid humanize duration {s}: {e}")),
        },
        _ => Err(anyhow!("frequency should be a humanize duration string or an integer")),
    }
}

fn parse_percentile(s: &str) -> anyhow::Result<f64> {
    let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 value: {e}"))?;
    let p = Percentile::new(f)?;
    Ok(p.value())
}

pub fn as_percentile(value: &Yaml) -> anyhow::Result<f64> {
    match value {
        Yaml::String(s) | Yaml::Real(s) => parse_percentile(s),
        Yaml::Integer(i) => {
            let p = Percentile::new(*i as f64)?;
            Ok(p.value())
        }
        _ => Err(anyhow!(
            "yaml value type for 'percentile' should be 'str' or 'float' or 'integer'"
        )),
    }
}

pub fn as_percentile_list(value: &Yaml) -> anyhow::Result<Vec<f64>> {
    let mut list = Vec::new();
    match value {
        Yaml::String(s) => {
            for v in s.split(',') {
                let v = v.trim();
                if v.is_empty() {
                    continue;
                }
                let f = parse_percentile(v)
                    .context(format!("invalid percentile string {v}"))?;
                list.push(f);
            }
        }
        Yaml::Array(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let f = as_percentile(v)
                    .context(format!("invalid percentile value for element #{i}"))?;
                list.push(f);
            }
        }
        _ => {
            return Err(anyhow!(
                "the yaml value type for 'percentile list' should be 'seq' or 'str'"
            ));
        }
    }
    Ok(list)
}

pub fn as_accumulator_kind(value: &Yaml) -> anyhow::Result<AccumulatorKind> {
    if let Yaml::String(s) = value {
        match normalize_key(s).as_str() {
            "window" | "sample_window" => Ok(AccumulatorKind::Window),
            "histogram" | "hdr_histogram" => Ok(AccumulatorKind::Histogram),
            _ => Err(anyhow!("unsupported accumulator type {s}")),
        }
    } else {
        Err(anyhow!(
            "yaml value type for 'accumulator' should be 'string'"
        ))
    }
}

/// Parse a stats config.
///
/// A scalar value is the simplified form, which sets only the frequency.
pub fn as_stats_config(value: &Yaml) -> anyhow::Result<StatsConfig> {
    let Yaml::Hash(map) = value else {
        let frequency = as_frequency(value).context(
            "the value for simplified form of stats config map should be humanize duration",
        )?;
        let config = StatsConfig::with_frequency(frequency);
        config.check()?;
        return Ok(config);
    };

    let mut config = StatsConfig::default();
    for (k, v) in map.iter() {
        let Yaml::String(k) = k else {
            return Err(anyhow!("key in stats config map should be string"));
        };
        set_config_value(&mut config, k, v).context(format!("invalid value for key {k}"))?;
    }
    config.check()?;
    Ok(config)
}

fn set_config_value(config: &mut StatsConfig, k: &str, v: &Yaml) -> anyhow::Result<()> {
    match normalize_key(k).as_str() {
        "sample_size" => config.set_sample_size(as_sample_size(v)?),
        "percentiles" | "percentile" => config.set_percentiles(as_percentile_list(v)?),
        "frequency" | "interval" => config.set_frequency(as_frequency(v)?),
        "accumulator" => config.set_accumulator(as_accumulator_kind(v)?),
        "publish_count" => config.set_publish_count(as_flag(v)?),
        "publish_total" => config.set_publish_total(as_flag(v)?),
        "publish_min" => config.set_publish_min(as_flag(v)?),
        "publish_max" => config.set_publish_max(as_flag(v)?),
        "publish_mean" => config.set_publish_mean(as_flag(v)?),
        "publish_variance" => config.set_publish_variance(as_flag(v)?),
        "publish_std_dev" | "publish_stddev" => config.set_publish_std_dev(as_flag(v)?),
        _ => return Err(anyhow!("unknown key")),
    }
    Ok(())
}
