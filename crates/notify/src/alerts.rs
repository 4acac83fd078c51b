//! Cooldown-gated alerting.
//!
//! Each `(metric, tier)` pair has its own cooldown key. The first alert for
//! a key always fires; later ones fire once `now - last_fired >= cooldown`.
//! Keys are independent, so an escalation from `high` to `critical` alerts
//! immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use hostwatch_core::config::{AlertChannel, AlertConfig};
use hostwatch_core::ClassifiedMetric;
use tokio::task::JoinSet;

use crate::console::ConsoleNotifier;
use crate::desktop::DesktopNotifier;
use crate::dispatcher::Dispatcher;
use crate::email::EmailNotifier;
use crate::templating::{AlertContext, MessageTemplates};
use crate::traits::{DispatchResult, Notification, Notifier, NotifyError};
use crate::webhook::WebhookNotifier;

/// Cooldown key for a classified metric: `metric_tier`, e.g. `cpu_critical`.
pub fn alert_key(metric: &ClassifiedMetric) -> String {
    format!("{}_{}", metric.metric, metric.tier)
}

/// What happened to one alert request.
#[derive(Debug, Clone)]
pub enum AlertOutcome {
    /// Alerting is switched off.
    Disabled,
    /// Same key fired within the cooldown window.
    Suppressed,
    /// Sent to every channel; one result per channel.
    Dispatched(Vec<DispatchResult>),
    /// Passed cooldown and handed to background delivery.
    Queued,
    /// The message could not be rendered.
    RenderFailed(String),
}

impl AlertOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, AlertOutcome::Dispatched(_))
    }

    /// Dispatched now or queued for delivery.
    pub fn is_sent(&self) -> bool {
        matches!(self, AlertOutcome::Dispatched(_) | AlertOutcome::Queued)
    }
}

/// Sends alerts through a [`Dispatcher`], at most once per key per cooldown.
pub struct AlertManager {
    enabled: bool,
    cooldown: Duration,
    templates: MessageTemplates,
    dispatcher: Arc<Dispatcher>,
    last_fired: HashMap<String, DateTime<Utc>>,
    in_flight: JoinSet<()>,
}

impl AlertManager {
    pub fn new(
        enabled: bool,
        cooldown: Duration,
        templates: MessageTemplates,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            enabled,
            cooldown,
            templates,
            dispatcher: Arc::new(dispatcher),
            last_fired: HashMap::new(),
            in_flight: JoinSet::new(),
        }
    }

    /// Build channels, templates and dispatcher from config.
    pub fn from_config(config: &AlertConfig) -> Result<Self, NotifyError> {
        let templates =
            MessageTemplates::new(config.subject_template.clone(), config.body_template.clone())?;
        let dispatcher = Dispatcher::new(channels_from_config(config), config.channel_timeout);
        tracing::info!(
            enabled = config.enabled,
            cooldown_secs = config.cooldown.as_secs(),
            channels = ?dispatcher.channel_names(),
            "alert manager ready"
        );
        Ok(Self::new(config.enabled, config.cooldown, templates, dispatcher))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.dispatcher.channel_names()
    }

    pub fn last_fired(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_fired.get(key).copied()
    }

    /// Returns whether `key` may fire at `now`, recording `now` when it may.
    pub fn can_fire(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let ready = match self.last_fired.get(key) {
            None => true,
            // A negative elapsed time (clock moved back) counts as not yet elapsed.
            Some(last) => (now - *last)
                .to_std()
                .map(|elapsed| elapsed >= self.cooldown)
                .unwrap_or(false),
        };
        if ready {
            self.last_fired.insert(key.to_string(), now);
        }
        ready
    }

    pub async fn trigger_alert(&mut self, metric: &ClassifiedMetric) -> AlertOutcome {
        self.trigger_alert_at(metric, Utc::now()).await
    }

    pub async fn trigger_alert_at(
        &mut self,
        metric: &ClassifiedMetric,
        now: DateTime<Utc>,
    ) -> AlertOutcome {
        match self.prepare(metric, now) {
            Ok(notification) => AlertOutcome::Dispatched(self.dispatcher.dispatch(&notification).await),
            Err(outcome) => outcome,
        }
    }

    /// Alert on several metrics at once. Cooldown is checked per metric in
    /// order; the deliveries that pass run concurrently.
    pub async fn trigger_bulk(&mut self, metrics: &[ClassifiedMetric]) -> Vec<AlertOutcome> {
        self.trigger_bulk_at(metrics, Utc::now()).await
    }

    pub async fn trigger_bulk_at(
        &mut self,
        metrics: &[ClassifiedMetric],
        now: DateTime<Utc>,
    ) -> Vec<AlertOutcome> {
        let prepared: Vec<Result<Notification, AlertOutcome>> =
            metrics.iter().map(|m| self.prepare(m, now)).collect();

        let dispatcher = &self.dispatcher;
        let deliveries = prepared.into_iter().map(|p| async move {
            match p {
                Ok(notification) => AlertOutcome::Dispatched(dispatcher.dispatch(&notification).await),
                Err(outcome) => outcome,
            }
        });
        join_all(deliveries).await
    }

    /// Cooldown-check `metrics` in order and deliver the ones that pass on a
    /// background task. Returns without waiting on any channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue_bulk_at(
        &mut self,
        metrics: &[ClassifiedMetric],
        now: DateTime<Utc>,
    ) -> Vec<AlertOutcome> {
        self.reap();

        let mut ready = Vec::new();
        let outcomes = metrics
            .iter()
            .map(|m| match self.prepare(m, now) {
                Ok(notification) => {
                    ready.push(notification);
                    AlertOutcome::Queued
                }
                Err(outcome) => outcome,
            })
            .collect();

        if !ready.is_empty() {
            let dispatcher = Arc::clone(&self.dispatcher);
            // Per-channel failures and timeouts are logged by the dispatcher.
            self.in_flight.spawn(async move {
                join_all(ready.iter().map(|n| dispatcher.dispatch(n))).await;
            });
        }
        outcomes
    }

    /// Number of background deliveries not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Wait for every queued delivery. Each is bounded by the channel timeout.
    pub async fn flush(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "alert delivery task failed");
            }
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "alert delivery task failed");
            }
        }
    }

    /// Send the channel self-test through every channel, ignoring cooldown.
    pub async fn send_test(&self) -> Vec<DispatchResult> {
        self.dispatcher.test_all().await
    }

    fn prepare(
        &mut self,
        metric: &ClassifiedMetric,
        now: DateTime<Utc>,
    ) -> Result<Notification, AlertOutcome> {
        if !self.enabled {
            return Err(AlertOutcome::Disabled);
        }

        let key = alert_key(metric);
        if !self.can_fire(&key, now) {
            tracing::debug!(key = %key, "alert suppressed by cooldown");
            return Err(AlertOutcome::Suppressed);
        }

        let ctx = AlertContext::from_metric(metric, now);
        match self.templates.render(&ctx) {
            Ok(notification) => Ok(notification),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "alert template failed, using default format");
                MessageTemplates::default()
                    .render(&ctx)
                    .map_err(|e| AlertOutcome::RenderFailed(e.to_string()))
            }
        }
    }
}

/// Instantiate every configured channel. A channel that cannot be built is
/// logged and left out so the others still deliver.
pub fn channels_from_config(config: &AlertConfig) -> Vec<Box<dyn Notifier>> {
    let mut channels: Vec<Box<dyn Notifier>> = Vec::with_capacity(config.channels.len());

    for channel in &config.channels {
        let built: Result<Box<dyn Notifier>, NotifyError> = match channel {
            AlertChannel::Console => Ok(Box::new(ConsoleNotifier)),
            AlertChannel::Desktop => Ok(Box::new(DesktopNotifier::new())),
            AlertChannel::Email => {
                EmailNotifier::from_config(&config.email).map(|n| Box::new(n) as Box<dyn Notifier>)
            }
            AlertChannel::Webhook => match config.webhook_url.as_deref() {
                Some(url) => WebhookNotifier::new(url).map(|n| Box::new(n) as Box<dyn Notifier>),
                None => Err(NotifyError::Config("ALERT_WEBHOOK_URL is not set".to_string())),
            },
        };

        match built {
            Ok(notifier) => channels.push(notifier),
            Err(e) => tracing::error!(channel = %channel, error = %e, "alert channel disabled"),
        }
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hostwatch_core::config::EmailConfig;
    use hostwatch_core::{MetricKind, Priority, Severity};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockNotifier {
        name: &'static str,
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
        seen: Arc<Mutex<Vec<Notification>>>,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(notification.clone());
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            self.name
        }
    }

    struct Harness {
        manager: AlertManager,
        count: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<Notification>>>,
    }

    fn harness(enabled: bool, cooldown_secs: u64) -> Harness {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let channel: Box<dyn Notifier> = Box::new(MockNotifier {
            name: "mock",
            send_count: count.clone(),
            should_fail: false,
            seen: seen.clone(),
        });
        let manager = AlertManager::new(
            enabled,
            Duration::from_secs(cooldown_secs),
            MessageTemplates::default(),
            Dispatcher::new(vec![channel], Duration::from_secs(1)),
        );
        Harness {
            manager,
            count,
            seen,
        }
    }

    fn cm(metric: MetricKind, value: f64, tier: Severity) -> ClassifiedMetric {
        ClassifiedMetric {
            metric,
            value,
            tier,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn repeat_within_cooldown_is_suppressed() {
        let mut h = harness(true, 300);
        let cpu = cm(MetricKind::Cpu, 95.0, Severity::Critical);

        assert!(h.manager.trigger_alert_at(&cpu, t0()).await.is_dispatched());
        let second = h
            .manager
            .trigger_alert_at(&cpu, t0() + chrono::Duration::seconds(100))
            .await;
        assert!(matches!(second, AlertOutcome::Suppressed));
        assert_eq!(h.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeat_after_cooldown_fires() {
        let mut h = harness(true, 300);
        let cpu = cm(MetricKind::Cpu, 95.0, Severity::Critical);

        h.manager.trigger_alert_at(&cpu, t0()).await;
        let later = t0() + chrono::Duration::seconds(301);
        assert!(h.manager.trigger_alert_at(&cpu, later).await.is_dispatched());
        assert_eq!(h.count.load(Ordering::SeqCst), 2);
        assert_eq!(h.manager.last_fired("cpu_critical"), Some(later));
    }

    #[tokio::test]
    async fn exact_cooldown_boundary_fires() {
        let mut h = harness(true, 300);
        let cpu = cm(MetricKind::Cpu, 95.0, Severity::Critical);
        h.manager.trigger_alert_at(&cpu, t0()).await;
        let at = t0() + chrono::Duration::seconds(300);
        assert!(h.manager.trigger_alert_at(&cpu, at).await.is_dispatched());
    }

    #[tokio::test]
    async fn suppressed_alert_does_not_extend_window() {
        let mut h = harness(true, 300);
        let cpu = cm(MetricKind::Cpu, 95.0, Severity::Critical);
        h.manager.trigger_alert_at(&cpu, t0()).await;
        h.manager
            .trigger_alert_at(&cpu, t0() + chrono::Duration::seconds(200))
            .await;
        assert_eq!(h.manager.last_fired("cpu_critical"), Some(t0()));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let mut h = harness(true, 300);
        let now = t0();
        h.manager
            .trigger_alert_at(&cm(MetricKind::Cpu, 80.0, Severity::High), now)
            .await;
        let escalated = h
            .manager
            .trigger_alert_at(&cm(MetricKind::Cpu, 95.0, Severity::Critical), now)
            .await;
        let other_metric = h
            .manager
            .trigger_alert_at(&cm(MetricKind::Ram, 85.0, Severity::High), now)
            .await;
        assert!(escalated.is_dispatched());
        assert!(other_metric.is_dispatched());
        assert_eq!(h.count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn disabled_manager_sends_nothing() {
        let mut h = harness(false, 300);
        let out = h
            .manager
            .trigger_alert_at(&cm(MetricKind::Disk, 99.0, Severity::Critical), t0())
            .await;
        assert!(matches!(out, AlertOutcome::Disabled));
        assert_eq!(h.count.load(Ordering::SeqCst), 0);
        assert!(h.manager.last_fired("disk_critical").is_none());
    }

    #[tokio::test]
    async fn message_carries_priority_and_text() {
        let mut h = harness(true, 300);
        h.manager
            .trigger_alert_at(&cm(MetricKind::Ram, 82.5, Severity::High), t0())
            .await;
        let seen = h.seen.lock().unwrap();
        assert_eq!(seen[0].priority, Priority::High);
        assert_eq!(seen[0].subject, "[HIGH] System Alert: RAM");
        assert_eq!(seen[0].body, "Metric: RAM | Status: HIGH | Current Value: 82.5");
    }

    #[tokio::test]
    async fn bulk_applies_cooldown_per_metric() {
        let mut h = harness(true, 300);
        let metrics = [
            cm(MetricKind::Cpu, 95.0, Severity::Critical),
            cm(MetricKind::Cpu, 95.0, Severity::Critical),
            cm(MetricKind::Disk, 88.0, Severity::High),
        ];
        let outcomes = h.manager.trigger_bulk_at(&metrics, t0()).await;
        assert!(outcomes[0].is_dispatched());
        assert!(matches!(outcomes[1], AlertOutcome::Suppressed));
        assert!(outcomes[2].is_dispatched());
        assert_eq!(h.count.load(Ordering::SeqCst), 2);
    }

    struct HungNotifier;

    #[async_trait::async_trait]
    impl Notifier for HungNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
        fn channel_name(&self) -> &str {
            "hung"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_returns_while_channel_hangs() {
        let channel: Box<dyn Notifier> = Box::new(HungNotifier);
        let mut manager = AlertManager::new(
            true,
            Duration::from_secs(300),
            MessageTemplates::default(),
            Dispatcher::new(vec![channel], Duration::from_secs(10)),
        );
        let cpu = [cm(MetricKind::Cpu, 95.0, Severity::Critical)];

        let started = tokio::time::Instant::now();
        let outcomes = manager.enqueue_bulk_at(&cpu, t0());
        assert!(matches!(outcomes[0], AlertOutcome::Queued));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(manager.in_flight(), 1);
        assert!(manager.last_fired("cpu_critical").is_some());

        // the channel timeout bounds the wait
        manager.flush().await;
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn enqueue_applies_cooldown_per_metric() {
        let mut h = harness(true, 300);
        let metrics = [
            cm(MetricKind::Cpu, 95.0, Severity::Critical),
            cm(MetricKind::Cpu, 95.0, Severity::Critical),
            cm(MetricKind::Disk, 88.0, Severity::High),
        ];
        let outcomes = h.manager.enqueue_bulk_at(&metrics, t0());
        assert!(outcomes[0].is_sent());
        assert!(matches!(outcomes[1], AlertOutcome::Suppressed));
        assert!(outcomes[2].is_sent());

        h.manager.flush().await;
        assert_eq!(h.count.load(Ordering::SeqCst), 2);

        let again = h.manager.enqueue_bulk_at(&metrics[..1], t0() + chrono::Duration::seconds(10));
        assert!(matches!(again[0], AlertOutcome::Suppressed));
        assert_eq!(h.manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn failing_channel_is_reported_not_raised() {
        let ok_count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let channels: Vec<Box<dyn Notifier>> = vec![
            Box::new(MockNotifier {
                name: "broken",
                send_count: Arc::new(AtomicUsize::new(0)),
                should_fail: true,
                seen: seen.clone(),
            }),
            Box::new(MockNotifier {
                name: "ok",
                send_count: ok_count.clone(),
                should_fail: false,
                seen,
            }),
        ];
        let mut manager = AlertManager::new(
            true,
            Duration::from_secs(300),
            MessageTemplates::default(),
            Dispatcher::new(channels, Duration::from_secs(1)),
        );
        let out = manager
            .trigger_alert_at(&cm(MetricKind::Temperature, 90.0, Severity::Critical), t0())
            .await;
        let AlertOutcome::Dispatched(results) = out else {
            panic!("expected dispatch");
        };
        assert!(!results[0].success);
        assert!(results[1].success);
        assert_eq!(ok_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn channels_built_from_config_skip_broken_ones() {
        let config = AlertConfig {
            enabled: true,
            cooldown: Duration::from_secs(300),
            channels: vec![AlertChannel::Console, AlertChannel::Webhook, AlertChannel::Desktop],
            channel_timeout: Duration::from_secs(10),
            subject_template: None,
            body_template: None,
            email: EmailConfig {
                smtp_host: None,
                smtp_port: None,
                tls: true,
                from: None,
                to: Vec::new(),
            },
            webhook_url: None,
        };
        let channels = channels_from_config(&config);
        let names: Vec<&str> = channels.iter().map(|c| c.channel_name()).collect();
        assert_eq!(names, vec!["console", "desktop"]);
    }

    #[test]
    fn alert_key_format() {
        assert_eq!(
            alert_key(&cm(MetricKind::ProcessCount, 420.0, Severity::Critical)),
            "process_count_critical"
        );
    }
}
