use std::sync::Arc;

use chrono::{DateTime, Utc};
use hostwatch_core::config::PredictionConfig;
use hostwatch_core::{clamp_percent, ClassifiedMetric, PredictionMode, RiskEstimate};
use hostwatch_storage::{PersistenceSink, PredictionRecord};

use crate::error::ModelError;
use crate::features::FeatureVector;
use crate::model::{load_model, FailureModel, ModelOutput};
use crate::rule_based::rule_based_estimate;

/// Estimation strategy, fixed at construction.
pub enum Strategy {
    RuleBased,
    Learned(Box<dyn FailureModel>),
}

impl Strategy {
    pub fn mode(&self) -> PredictionMode {
        match self {
            Strategy::RuleBased => PredictionMode::RuleBased,
            Strategy::Learned(_) => PredictionMode::Ml,
        }
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::RuleBased => f.write_str("RuleBased"),
            Strategy::Learned(model) => f.debug_tuple("Learned").field(&model.name()).finish(),
        }
    }
}

/// Produces a [`RiskEstimate`] per cycle and appends it to the prediction log.
pub struct FailurePredictor {
    strategy: Strategy,
    threshold: f64,
    sink: Arc<dyn PersistenceSink>,
}

impl FailurePredictor {
    pub fn new(strategy: Strategy, threshold: f64, sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            strategy,
            threshold: threshold.clamp(0.0, 1.0),
            sink,
        }
    }

    /// Select the learned strategy when enabled and the model loads, else rule-based.
    pub fn from_config(config: &PredictionConfig, sink: Arc<dyn PersistenceSink>) -> Self {
        let strategy = if config.ml_enabled {
            match load_model(&config.model_path) {
                Ok(model) => Strategy::Learned(model),
                Err(e) => {
                    tracing::warn!(
                        path = %config.model_path.display(),
                        error = %e,
                        "failure model unavailable, using rule-based risk"
                    );
                    Strategy::RuleBased
                }
            }
        } else {
            Strategy::RuleBased
        };
        tracing::info!(mode = %strategy.mode(), threshold = config.confidence_threshold, "failure predictor ready");
        Self::new(strategy, config.confidence_threshold, sink)
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn predict(&self, classified: &[ClassifiedMetric]) -> RiskEstimate {
        self.predict_at(classified, Utc::now())
    }

    /// Estimate risk and record it. Never fails: learned-model errors fall
    /// back to rule-based, a failed log append is only logged.
    pub fn predict_at(&self, classified: &[ClassifiedMetric], now: DateTime<Utc>) -> RiskEstimate {
        let estimate = match &self.strategy {
            Strategy::RuleBased => rule_based_estimate(classified, self.threshold),
            Strategy::Learned(model) => match self.learned_estimate(model.as_ref(), classified) {
                Ok(estimate) => estimate,
                Err(e) => {
                    tracing::warn!(model = model.name(), error = %e, "model inference failed, falling back to rule-based");
                    rule_based_estimate(classified, self.threshold)
                }
            },
        };

        tracing::debug!(
            mode = %estimate.mode,
            probability = estimate.probability,
            confidence = estimate.confidence,
            high_risk = estimate.high_risk,
            "failure risk estimated"
        );

        let record = PredictionRecord::from_estimate(&estimate, now);
        if let Err(e) = self.sink.append_prediction(&record) {
            tracing::warn!(error = %e, "failed to append prediction log");
        }

        estimate
    }

    fn learned_estimate(
        &self,
        model: &dyn FailureModel,
        classified: &[ClassifiedMetric],
    ) -> Result<RiskEstimate, ModelError> {
        let features = FeatureVector::from_classified(classified);
        let (probability, confidence) = match model.infer(&features)? {
            ModelOutput::Probabilities(p) => {
                let failure = p.get(1).copied().ok_or_else(|| {
                    ModelError::Inference(format!("expected 2 class probabilities, got {}", p.len()))
                })?;
                if p.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::Inference("non-finite class probability".into()));
                }
                let max = p.iter().copied().fold(f64::MIN, f64::max);
                (failure * 100.0, max * 100.0)
            }
            ModelOutput::Label(true) => (100.0, 100.0),
            ModelOutput::Label(false) => (0.0, 100.0),
        };

        Ok(RiskEstimate::new(
            f64::from(clamp_percent(probability)),
            f64::from(clamp_percent(confidence)),
            self.threshold,
            PredictionMode::Ml,
        ))
    }
}
