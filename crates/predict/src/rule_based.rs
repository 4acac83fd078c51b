use hostwatch_core::{ClassifiedMetric, PredictionMode, RiskEstimate, Severity};

const BASE_CONFIDENCE: f64 = 60.0;

/// Risk points contributed by one metric in `tier`.
pub fn tier_increment(tier: Severity) -> u32 {
    match tier {
        Severity::Normal => 0,
        Severity::Warning => 10,
        Severity::High => 20,
        Severity::Critical => 35,
    }
}

/// Sum tier increments over every classified metric, capped at 100.
///
/// Confidence is `60 + probability / 4`, so it always lies in 60–85.
pub fn rule_based_estimate(classified: &[ClassifiedMetric], threshold: f64) -> RiskEstimate {
    let probability = classified
        .iter()
        .map(|m| tier_increment(m.tier))
        .sum::<u32>()
        .min(100);
    let probability = f64::from(probability);
    let confidence = BASE_CONFIDENCE + probability / 4.0;

    RiskEstimate::new(probability, confidence, threshold, PredictionMode::RuleBased)
}
