//! Maps raw metric values to severity tiers.

use hostwatch_core::{ClassifiedMetric, MetricKind, MetricsSnapshot};

use crate::thresholds::ThresholdTable;

/// Classify one metric value against the table.
///
/// Returns `None` when the value is absent or not finite, or when the table has
/// no entry for `metric`. Neither case is an error: the metric simply drops out
/// of this cycle.
pub fn classify(
    metric: MetricKind,
    value: Option<f64>,
    table: &ThresholdTable,
) -> Option<ClassifiedMetric> {
    let value = value.filter(|v| v.is_finite())?;
    let set = table.get(metric)?;
    Some(ClassifiedMetric {
        metric,
        value,
        tier: set.tier_for(value),
    })
}

/// Classify every metric present in `snapshot`, in [`MetricKind::ALL`] order.
pub fn classify_snapshot(snapshot: &MetricsSnapshot, table: &ThresholdTable) -> Vec<ClassifiedMetric> {
    MetricKind::ALL
        .into_iter()
        .filter_map(|kind| classify(kind, snapshot.value_of(kind), table))
        .collect()
}
