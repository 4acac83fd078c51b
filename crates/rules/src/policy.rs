//! HealthPolicy document: thresholds, weights, and score range in one YAML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};
use crate::health_score::{ScoreRange, Weights};
use crate::thresholds::ThresholdTable;

pub const POLICY_KIND: &str = "HealthPolicy";

/// Top-level HealthPolicy document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HealthPolicy {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: PolicyMetadata,
    pub spec: PolicySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicyMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of a HealthPolicy: score range, thresholds and weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicySpec {
    #[serde(default)]
    pub score_range: ScoreRange,
    pub thresholds: ThresholdTable,
    pub weights: Weights,
}

impl HealthPolicy {
    /// Built-in host policy.
    pub fn builtin() -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: POLICY_KIND.to_string(),
            metadata: PolicyMetadata {
                id: "builtin".to_string(),
                name: "Built-in host policy".to_string(),
                description: None,
            },
            spec: PolicySpec {
                score_range: ScoreRange::default(),
                thresholds: ThresholdTable::builtin(),
                weights: Weights::builtin(),
            },
        }
    }

    /// Parse and validate a policy from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let policy: HealthPolicy = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load `path` if given and present, otherwise fall back to [`HealthPolicy::builtin`].
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => {
                let policy = Self::from_file(p)?;
                tracing::info!(
                    path = %p.display(),
                    id = %policy.metadata.id,
                    metrics = policy.spec.thresholds.len(),
                    "loaded health policy"
                );
                Ok(policy)
            }
            Some(p) => {
                tracing::warn!(path = %p.display(), "health policy not found, using built-in");
                Ok(Self::builtin())
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Check tier ordering, weight sanity and the score range.
    pub fn validate(&self) -> Result<()> {
        if self.kind != POLICY_KIND {
            return Err(PolicyError::Validation(format!(
                "expected kind '{POLICY_KIND}', got '{}'",
                self.kind
            )));
        }

        for (metric, set) in self.spec.thresholds.iter() {
            if !set.is_ordered() {
                return Err(PolicyError::Validation(format!(
                    "thresholds for '{metric}' must satisfy normal <= warning <= high <= critical"
                )));
            }
        }

        for (metric, weight) in self.spec.weights.iter() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(PolicyError::Validation(format!(
                    "weight for '{metric}' must be a non-negative number, got {weight}"
                )));
            }
            if self.spec.thresholds.get(*metric).is_none() {
                tracing::warn!(%metric, "weighted metric has no thresholds and will never score");
            }
        }

        let total = self.spec.weights.total();
        if total <= 0.0 {
            tracing::warn!("policy weights sum to zero, health score will always be max");
        } else if (total - 1.0).abs() > 1e-6 {
            tracing::debug!(total, "policy weights do not sum to 1.0");
        }

        let range = self.spec.score_range;
        if range.min >= range.max {
            return Err(PolicyError::Validation(format!(
                "score_range.min ({}) must be below score_range.max ({})",
                range.min, range.max
            )));
        }

        Ok(())
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}
