/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use super::{MetricName, MetricTagMap, MetricTagName, MetricTagValue};

/// Name and tags of one published metric.
///
/// Two identities are equal if both the name and the whole tag set match.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricIdentity {
    name: MetricName,
    tags: MetricTagMap,
}

impl MetricIdentity {
    pub fn new(name: MetricName) -> Self {
        MetricIdentity {
            name,
            tags: MetricTagMap::default(),
        }
    }

    pub fn with_tags(name: MetricName, tags: MetricTagMap) -> Self {
        MetricIdentity { name, tags }
    }

    #[inline]
    pub fn name(&self) -> &MetricName {
        &self.name
    }

    #[inline]
    pub fn tags(&self) -> &MetricTagMap {
        &self.tags
    }

    #[inline]
    pub fn tag(&self, name: &str) -> Option<&MetricTagValue> {
        self.tags.get(name)
    }

    /// Derive a new identity with one more tag. An existing tag with the
    /// same name will be replaced.
    pub fn with_tag(&self, name: MetricTagName, value: MetricTagValue) -> Self {
        let mut tags = self.tags.clone();
        tags.insert(name, value);
        MetricIdentity {
            name: self.name.clone(),
            tags,
        }
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{{{}}}", self.name, self.tags)
        }
    }
}
