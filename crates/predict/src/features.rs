use hostwatch_core::{ClassifiedMetric, MetricKind};

/// Number of feature slots, one per [`MetricKind`].
pub const FEATURE_COUNT: usize = MetricKind::ALL.len();

/// Fixed-order model input: tier ordinal (0–3) per metric slot.
///
/// Slot order is [`MetricKind::ALL`]; metrics absent this cycle stay at 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_classified(classified: &[ClassifiedMetric]) -> Self {
        let mut slots = [0.0; FEATURE_COUNT];
        for item in classified {
            slots[item.metric.slot()] = f64::from(item.tier.ordinal());
        }
        Self(slots)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, metric: MetricKind) -> f64 {
        self.0[metric.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::Severity;

    #[test]
    fn slots_follow_metric_order() {
        let fv = FeatureVector::from_classified(&[
            ClassifiedMetric {
                metric: MetricKind::Temperature,
                value: 80.0,
                tier: Severity::High,
            },
            ClassifiedMetric {
                metric: MetricKind::Cpu,
                value: 95.0,
                tier: Severity::Critical,
            },
        ]);
        assert_eq!(fv.as_slice(), &[3.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert_eq!(fv.get(MetricKind::Temperature), 2.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let fv = FeatureVector::from_classified(&[]);
        assert!(fv.as_slice().iter().all(|v| *v == 0.0));
        assert_eq!(fv.as_slice().len(), FEATURE_COUNT);
    }
}
