//! Weighted aggregation of classified metrics into a single health score.

use std::collections::BTreeMap;

use hostwatch_core::{ClassifiedMetric, MetricKind, Severity};
use serde::{Deserialize, Serialize};

/// Fixed penalty per tier.
pub fn severity_penalty(tier: Severity) -> f64 {
    match tier {
        Severity::Normal => 0.0,
        Severity::Warning => 25.0,
        Severity::High => 50.0,
        Severity::Critical => 100.0,
    }
}

/// Per-metric weights. Metrics without an entry do not affect the score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights {
    weights: BTreeMap<MetricKind, f64>,
}

impl Weights {
    pub fn new(weights: BTreeMap<MetricKind, f64>) -> Self {
        Self { weights }
    }

    /// cpu .30, ram .30, disk .25, network .10, temperature .05.
    pub fn builtin() -> Self {
        Self::new(BTreeMap::from([
            (MetricKind::Cpu, 0.30),
            (MetricKind::Ram, 0.30),
            (MetricKind::Disk, 0.25),
            (MetricKind::Network, 0.10),
            (MetricKind::Temperature, 0.05),
        ]))
    }

    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        self.weights.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricKind, &f64)> {
        self.weights.iter()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// Inclusive bounds of the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

/// Aggregate classified metrics into a score within `range`.
///
/// Each weighted metric contributes `weight * penalty`; the score is
/// `max - total_penalty / total_weight`, clamped to the range and truncated.
/// With no classified metrics, or no weight among them, the score is `range.max`.
/// An inverted range (`min > max`) yields `range.min` rather than panicking.
pub fn score(classified: &[ClassifiedMetric], weights: &Weights, range: ScoreRange) -> u32 {
    if classified.is_empty() {
        tracing::debug!("no classified metrics, returning max health score");
        return range.max;
    }

    let mut total_penalty = 0.0;
    let mut total_weight = 0.0;

    for item in classified {
        let Some(weight) = weights.get(item.metric) else {
            continue;
        };
        total_penalty += weight * severity_penalty(item.tier);
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        tracing::debug!("total weight is zero, returning max health score");
        return range.max;
    }

    let raw = f64::from(range.max) - total_penalty / total_weight;
    let clamped = raw.min(f64::from(range.max)).max(f64::from(range.min));
    clamped.trunc() as u32
}
