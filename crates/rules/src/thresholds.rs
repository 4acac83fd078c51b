//! Static per-metric tier boundaries.

use std::collections::BTreeMap;

use hostwatch_core::{MetricKind, Severity};
use serde::{Deserialize, Serialize};

/// Lower bounds of each tier for one metric.
///
/// Boundaries are inclusive at the lower end: a value equal to `high` is
/// [`Severity::High`]. Anything strictly below `warning` is normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdSet {
    #[serde(default)]
    pub normal: f64,
    pub warning: f64,
    pub high: f64,
    pub critical: f64,
}

impl ThresholdSet {
    pub const fn new(warning: f64, high: f64, critical: f64) -> Self {
        Self {
            normal: 0.0,
            warning,
            high,
            critical,
        }
    }

    /// Tier for `value`: the highest tier whose lower bound `value` meets.
    pub fn tier_for(&self, value: f64) -> Severity {
        if value >= self.critical {
            Severity::Critical
        } else if value >= self.high {
            Severity::High
        } else if value >= self.warning {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    /// Lower bound of `tier`.
    pub fn bound(&self, tier: Severity) -> f64 {
        match tier {
            Severity::Normal => self.normal,
            Severity::Warning => self.warning,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }

    /// Whether `normal <= warning <= high <= critical` holds and all bounds are finite.
    pub fn is_ordered(&self) -> bool {
        let bounds = [self.normal, self.warning, self.high, self.critical];
        bounds.iter().all(|b| b.is_finite()) && bounds.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Threshold sets keyed by metric. A metric with no entry is never classified.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    sets: BTreeMap<MetricKind, ThresholdSet>,
}

impl ThresholdTable {
    pub fn new(sets: BTreeMap<MetricKind, ThresholdSet>) -> Self {
        Self { sets }
    }

    /// Built-in host thresholds.
    pub fn builtin() -> Self {
        let sets = BTreeMap::from([
            (MetricKind::Cpu, ThresholdSet::new(60.0, 75.0, 90.0)),
            (MetricKind::Ram, ThresholdSet::new(65.0, 80.0, 90.0)),
            (MetricKind::Disk, ThresholdSet::new(70.0, 85.0, 95.0)),
            // MB/s, upload + download
            (MetricKind::Network, ThresholdSet::new(5.0, 10.0, 20.0)),
            // °C
            (MetricKind::Temperature, ThresholdSet::new(60.0, 75.0, 85.0)),
            (MetricKind::ProcessCount, ThresholdSet::new(200.0, 300.0, 400.0)),
            (MetricKind::LoadAverage, ThresholdSet::new(1.5, 3.0, 5.0)),
        ]);
        Self { sets }
    }

    pub fn get(&self, metric: MetricKind) -> Option<&ThresholdSet> {
        self.sets.get(&metric)
    }

    pub fn insert(&mut self, metric: MetricKind, set: ThresholdSet) {
        self.sets.insert(metric, set);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricKind, &ThresholdSet)> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_on_the_low_side() {
        let set = ThresholdSet::new(60.0, 75.0, 90.0);
        assert_eq!(set.tier_for(59.999), Severity::Normal);
        assert_eq!(set.tier_for(60.0), Severity::Warning);
        assert_eq!(set.tier_for(75.0), Severity::High);
        assert_eq!(set.tier_for(89.9), Severity::High);
        assert_eq!(set.tier_for(90.0), Severity::Critical);
        assert_eq!(set.tier_for(150.0), Severity::Critical);
    }

    #[test]
    fn collapsed_tiers_resolve_to_highest() {
        // warning == high == critical: any value at the bound is critical.
        let set = ThresholdSet::new(50.0, 50.0, 50.0);
        assert_eq!(set.tier_for(50.0), Severity::Critical);
        assert_eq!(set.tier_for(49.0), Severity::Normal);
    }

    #[test]
    fn value_equal_to_high_is_high_for_many_sets() {
        for (w, h, c) in [(1.0, 2.0, 3.0), (0.0, 0.0, 10.0), (10.0, 20.0, 20.5)] {
            let set = ThresholdSet::new(w, h, c);
            assert_eq!(set.tier_for(h), Severity::High, "set {w}/{h}/{c}");
        }
    }

    #[test]
    fn ordering_check() {
        assert!(ThresholdSet::new(60.0, 75.0, 90.0).is_ordered());
        assert!(ThresholdSet::new(5.0, 5.0, 5.0).is_ordered());
        assert!(!ThresholdSet::new(80.0, 75.0, 90.0).is_ordered());
        assert!(!ThresholdSet::new(f64::NAN, 75.0, 90.0).is_ordered());
    }

    #[test]
    fn builtin_table_covers_every_metric() {
        let table = ThresholdTable::builtin();
        for kind in MetricKind::ALL {
            let set = table.get(kind).expect("builtin threshold");
            assert!(set.is_ordered(), "{kind} thresholds out of order");
        }
        assert_eq!(table.get(MetricKind::Cpu).unwrap().bound(Severity::High), 75.0);
    }
}
