//! One analysis pass over a snapshot.

use std::sync::Arc;

use hostwatch_core::{AnalysisRecord, Config, MetricsSnapshot};
use hostwatch_notify::{AlertManager, AlertOutcome};
use hostwatch_predict::FailurePredictor;
use hostwatch_rules::{classify_snapshot, score, HealthPolicy, SuggestionEngine};
use hostwatch_storage::PersistenceSink;
use uuid::Uuid;

use crate::error::MonitorError;

/// Turns snapshots into [`AnalysisRecord`]s.
///
/// Owns the alert cooldown state, so a single analyzer must drive every
/// cycle of a monitor.
pub struct Analyzer {
    policy: HealthPolicy,
    suggestions: Option<SuggestionEngine>,
    alerts: AlertManager,
    predictor: FailurePredictor,
}

impl Analyzer {
    pub fn new(
        policy: HealthPolicy,
        alerts: AlertManager,
        predictor: FailurePredictor,
        suggestions_enabled: bool,
    ) -> Self {
        Self {
            policy,
            suggestions: suggestions_enabled.then(SuggestionEngine::new),
            alerts,
            predictor,
        }
    }

    /// Load the policy and build alerting and prediction from runtime config.
    pub fn from_config(
        config: &Config,
        sink: Arc<dyn PersistenceSink>,
    ) -> Result<Self, MonitorError> {
        let policy = HealthPolicy::load_or_builtin(config.monitor.policy_path.as_deref())?;
        let alerts = AlertManager::from_config(&config.alerts)?;
        let predictor = FailurePredictor::from_config(&config.prediction, sink);
        Ok(Self::new(
            policy,
            alerts,
            predictor,
            config.monitor.suggestions_enabled,
        ))
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    pub fn predictor(&self) -> &FailurePredictor {
        &self.predictor
    }

    /// Wait for queued alert deliveries to finish.
    pub async fn flush_alerts(&mut self) {
        self.alerts.flush().await;
    }

    /// Classify, alert, score, estimate risk and suggest, in that order.
    ///
    /// Never fails and never waits on an alert channel: cooldown is decided
    /// here, delivery runs in the background. Delivery and prediction-log
    /// problems are logged by the components that hit them.
    pub async fn analyze(&mut self, snapshot: &MetricsSnapshot) -> AnalysisRecord {
        let spec = &self.policy.spec;
        let classified = classify_snapshot(snapshot, &spec.thresholds);

        let abnormal: Vec<_> = classified
            .iter()
            .filter(|m| !m.tier.is_normal())
            .copied()
            .collect();
        if !abnormal.is_empty() {
            let outcomes = self.alerts.enqueue_bulk_at(&abnormal, snapshot.timestamp);
            let sent = outcomes.iter().filter(|o| o.is_sent()).count();
            let suppressed = outcomes
                .iter()
                .filter(|o| matches!(o, AlertOutcome::Suppressed))
                .count();
            tracing::debug!(abnormal = abnormal.len(), sent, suppressed, "alerts processed");
        }

        let health_score = score(&classified, &spec.weights, spec.score_range);
        let risk = self.predictor.predict_at(&classified, snapshot.timestamp);
        let suggestions = self
            .suggestions
            .as_ref()
            .map(|engine| engine.generate(&classified))
            .unwrap_or_default();

        let record = AnalysisRecord {
            cycle_id: Uuid::new_v4(),
            timestamp: snapshot.timestamp,
            metrics: classified,
            health_score,
            failure_risk: risk.probability,
            risk,
            suggestions,
        };

        tracing::info!(
            cycle_id = %record.cycle_id,
            health_score = record.health_score,
            failure_risk = record.failure_risk,
            mode = %record.risk.mode,
            abnormal = abnormal.len(),
            "analysis cycle complete"
        );
        record
    }
}
