//! Host health policy: threshold tiers, classification, weighted scoring.
//!
//! This crate provides:
//! - Per-metric [`ThresholdSet`]s collected in a [`ThresholdTable`]
//! - A pure classifier mapping raw values to [`Severity`](hostwatch_core::Severity) tiers
//! - The weighted health scorer
//! - Static remediation suggestions keyed by (metric, tier)
//! - YAML `HealthPolicy` documents bundling thresholds, weights and score range

pub mod classifier;
pub mod error;
pub mod health_score;
pub mod policy;
pub mod suggestions;
pub mod thresholds;

pub use classifier::{classify, classify_snapshot};
pub use error::PolicyError;
pub use health_score::{score, ScoreRange, Weights};
pub use policy::HealthPolicy;
pub use suggestions::SuggestionEngine;
pub use thresholds::{ThresholdSet, ThresholdTable};
