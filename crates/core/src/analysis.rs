//! Per-cycle analysis output shared with readers of the monitor.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metric::ClassifiedMetric;

/// Which estimator produced a [`RiskEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    RuleBased,
    Ml,
}

impl PredictionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMode::RuleBased => "rule_based",
            PredictionMode::Ml => "ml",
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucket over failure probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// `< 40` low, `< 70` medium, `< 90` high, otherwise critical.
    pub fn from_probability(probability: u8) -> Self {
        match probability {
            0..=39 => RiskLevel::Low,
            40..=69 => RiskLevel::Medium,
            70..=89 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

/// Failure-risk estimate for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEstimate {
    /// Probability-like failure risk, 0–100.
    pub probability: u8,
    /// 0–100. Rule-based estimates stay within 60–85.
    pub confidence: u8,
    pub high_risk: bool,
    pub mode: PredictionMode,
    pub level: RiskLevel,
}

impl RiskEstimate {
    /// Build an estimate, clamping both percentages to 0–100.
    ///
    /// `high_risk` is `probability >= threshold * 100`.
    pub fn new(probability: f64, confidence: f64, threshold: f64, mode: PredictionMode) -> Self {
        let probability = clamp_percent(probability);
        let confidence = clamp_percent(confidence);
        Self {
            probability,
            confidence,
            high_risk: f64::from(probability) >= threshold * 100.0,
            mode,
            level: RiskLevel::from_probability(probability),
        }
    }
}

/// Round half away from zero and clamp into `0..=100`.
pub fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// One immutable analysis result. Only the latest is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub cycle_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub metrics: Vec<ClassifiedMetric>,
    pub health_score: u32,
    pub failure_risk: u8,
    pub risk: RiskEstimate,
    pub suggestions: Vec<String>,
}
