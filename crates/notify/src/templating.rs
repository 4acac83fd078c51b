//! Minijinja templates for alert subject and body.
//!
//! Both templates are validated once at construction; rendering builds a
//! fresh [`minijinja::Environment`] per call since templates are plain strings.

use chrono::{DateTime, Utc};
use hostwatch_core::{ClassifiedMetric, Priority};

use crate::traits::{Notification, NotifyError};

pub const DEFAULT_SUBJECT_TEMPLATE: &str = "[{{ priority }}] System Alert: {{ metric | upper }}";

pub const DEFAULT_BODY_TEMPLATE: &str =
    "Metric: {{ metric | upper }} | Status: {{ tier | upper }} | Current Value: {{ value | round(2) }}";

/// Values available to alert templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertContext {
    /// Metric name, e.g. `cpu`.
    pub metric: String,
    /// Tier name, e.g. `critical`.
    pub tier: String,
    pub value: f64,
    pub priority: Priority,
    /// Cooldown key, `metric_tier`.
    pub key: String,
    /// ISO 8601 timestamp of the alert.
    pub now: String,
}

impl AlertContext {
    pub fn from_metric(metric: &ClassifiedMetric, now: DateTime<Utc>) -> Self {
        Self {
            metric: metric.metric.as_str().to_string(),
            tier: metric.tier.as_str().to_string(),
            value: metric.value,
            priority: metric.tier.priority(),
            key: crate::alerts::alert_key(metric),
            now: now.to_rfc3339(),
        }
    }
}

/// Subject and body templates for alerts.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    subject: String,
    body: String,
}

impl MessageTemplates {
    /// Use the given templates, falling back to the defaults for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if either template fails to parse.
    pub fn new(subject: Option<String>, body: Option<String>) -> Result<Self, NotifyError> {
        let subject = subject.unwrap_or_else(|| DEFAULT_SUBJECT_TEMPLATE.to_string());
        let body = body.unwrap_or_else(|| DEFAULT_BODY_TEMPLATE.to_string());
        validate(&subject)?;
        validate(&body)?;
        Ok(Self { subject, body })
    }

    /// Render a notification for `ctx`. The alert key and metric are
    /// copied into the notification metadata.
    pub fn render(&self, ctx: &AlertContext) -> Result<Notification, NotifyError> {
        let env = build_env();
        let subject = env
            .render_str(&self.subject, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        let body = env
            .render_str(&self.body, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))?;

        Ok(Notification::new(subject, body, ctx.priority)
            .with_metadata("alert_key", ctx.key.clone())
            .with_metadata("metric", ctx.metric.clone())
            .with_metadata("tier", ctx.tier.clone()))
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            body: DEFAULT_BODY_TEMPLATE.to_string(),
        }
    }
}

fn build_env() -> minijinja::Environment<'static> {
    let mut env = minijinja::Environment::new();
    env.add_filter("round", round_filter);
    env.add_filter("upper", upper_filter);
    env
}

fn validate(template_str: &str) -> Result<(), NotifyError> {
    build_env()
        .template_from_str(template_str)
        .map_err(|e| NotifyError::Template(e.to_string()))?;
    Ok(())
}

/// Round a float to N decimal places, dropping a zero fraction.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0) as usize;
    let s = format!("{value:.n$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn upper_filter(value: String) -> String {
    value.to_uppercase()
}
