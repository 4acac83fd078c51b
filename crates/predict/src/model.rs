//! Learned failure classifier contract and the JSON model formats it loads.
//!
//! Training happens offline; this crate only evaluates a serialized model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT};

/// What a classifier produced for one feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Class probabilities `[P(healthy), P(failure)]`.
    Probabilities(Vec<f64>),
    /// Hard prediction without probabilities. `true` means failure.
    Label(bool),
}

/// A classifier over [`FeatureVector`]s.
pub trait FailureModel: Send + Sync {
    fn infer(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError>;

    fn name(&self) -> &str;
}

/// On-disk model document, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SerializedModel {
    /// Binary logistic regression, exposes class probabilities.
    Logistic {
        #[serde(default = "default_name")]
        name: String,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Linear decision function `w·x + b >= threshold`, labels only.
    LinearThreshold {
        #[serde(default = "default_name")]
        name: String,
        coefficients: Vec<f64>,
        #[serde(default)]
        intercept: f64,
        #[serde(default)]
        threshold: f64,
    },
}

fn default_name() -> String {
    "unnamed".to_string()
}

impl SerializedModel {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: SerializedModel = serde_json::from_str(json)?;
        model.check_shape()?;
        Ok(model)
    }

    fn coefficients(&self) -> &[f64] {
        match self {
            SerializedModel::Logistic { coefficients, .. }
            | SerializedModel::LinearThreshold { coefficients, .. } => coefficients,
        }
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        let got = self.coefficients().len();
        if got != FEATURE_COUNT {
            return Err(ModelError::Shape {
                expected: FEATURE_COUNT,
                got,
            });
        }
        Ok(())
    }

    fn decision(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let (coefficients, intercept) = match self {
            SerializedModel::Logistic {
                coefficients,
                intercept,
                ..
            }
            | SerializedModel::LinearThreshold {
                coefficients,
                intercept,
                ..
            } => (coefficients, *intercept),
        };
        let x = features.as_slice();
        if coefficients.len() != x.len() {
            return Err(ModelError::Shape {
                expected: coefficients.len(),
                got: x.len(),
            });
        }
        let z: f64 = coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + intercept;
        if !z.is_finite() {
            return Err(ModelError::Inference(format!(
                "decision value is not finite: {z}"
            )));
        }
        Ok(z)
    }
}

impl FailureModel for SerializedModel {
    fn infer(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError> {
        let z = self.decision(features)?;
        match self {
            SerializedModel::Logistic { .. } => {
                let p = 1.0 / (1.0 + (-z).exp());
                Ok(ModelOutput::Probabilities(vec![1.0 - p, p]))
            }
            SerializedModel::LinearThreshold { threshold, .. } => {
                Ok(ModelOutput::Label(z >= *threshold))
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            SerializedModel::Logistic { name, .. }
            | SerializedModel::LinearThreshold { name, .. } => name,
        }
    }
}

/// Read and validate a serialized model.
pub fn load_model(path: impl AsRef<Path>) -> Result<Box<dyn FailureModel>, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let model = SerializedModel::from_json(&content)?;
    tracing::info!(path = %path.display(), model = model.name(), "loaded failure model");
    Ok(Box::new(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::{ClassifiedMetric, MetricKind, Severity};
    use std::io::Write;

    const SHIPPED: &str = include_str!("../../../ml/model.json");

    fn critical_cpu() -> FeatureVector {
        FeatureVector::from_classified(&[ClassifiedMetric {
            metric: MetricKind::Cpu,
            value: 99.0,
            tier: Severity::Critical,
        }])
    }

    #[test]
    fn shipped_model_loads() {
        let model = SerializedModel::from_json(SHIPPED).unwrap();
        assert!(matches!(model, SerializedModel::Logistic { .. }));
        assert_eq!(model.name(), "host-failure-logreg-v1");
    }

    #[test]
    fn logistic_probabilities_sum_to_one() {
        let model = SerializedModel::from_json(SHIPPED).unwrap();
        let ModelOutput::Probabilities(p) = model.infer(&critical_cpu()).unwrap() else {
            panic!("expected probabilities");
        };
        assert_eq!(p.len(), 2);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_threshold_emits_label() {
        let json = r#"{
            "type": "linear_threshold",
            "coefficients": [1, 1, 1, 1, 1, 1, 1],
            "threshold": 3.0
        }"#;
        let model = SerializedModel::from_json(json).unwrap();
        assert_eq!(model.infer(&critical_cpu()).unwrap(), ModelOutput::Label(true));
        let healthy = FeatureVector::from_classified(&[]);
        assert_eq!(model.infer(&healthy).unwrap(), ModelOutput::Label(false));
    }

    #[test]
    fn wrong_coefficient_count_rejected() {
        let json = r#"{ "type": "logistic", "coefficients": [1.0, 2.0], "intercept": 0 }"#;
        let err = SerializedModel::from_json(json).unwrap_err();
        assert!(matches!(err, ModelError::Shape { expected: 7, got: 2 }));
    }

    #[test]
    fn unknown_type_rejected() {
        let json = r#"{ "type": "random_forest", "trees": [] }"#;
        assert!(matches!(
            SerializedModel::from_json(json),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SHIPPED.as_bytes()).unwrap();
        let model = load_model(file.path()).unwrap();
        assert_eq!(model.name(), "host-failure-logreg-v1");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_model(dir.path().join("none.json")).err().unwrap();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
