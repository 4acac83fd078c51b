//! End-to-end cycles: shipped policy, CSV persistence, cooldown-gated alerts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use hostwatch_core::{MetricsSnapshot, UsageStats};
use hostwatch_monitor::{Analyzer, CollectError, MetricsCollector, MonitorRunner};
use hostwatch_notify::{AlertManager, Dispatcher, MessageTemplates, Notification, Notifier, NotifyError};
use hostwatch_predict::{FailurePredictor, Strategy};
use hostwatch_rules::HealthPolicy;
use hostwatch_storage::{CsvSink, PersistenceSink};

const POLICY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/health-policy.yml");

struct Counter(Arc<AtomicUsize>);

#[async_trait::async_trait]
impl Notifier for Counter {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn channel_name(&self) -> &str {
        "counter"
    }
}

/// Hot CPU, one minute apart per call.
struct HotCpu {
    step: i64,
}

#[async_trait::async_trait]
impl MetricsCollector for HotCpu {
    async fn collect(&mut self) -> Result<MetricsSnapshot, CollectError> {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
            + chrono::Duration::minutes(self.step);
        self.step += 1;
        let mut s = MetricsSnapshot::empty(at);
        s.cpu = Some(92.5);
        s.ram = Some(UsageStats {
            total_gb: 32.0,
            used_gb: 27.2,
            percent: 85.0,
        });
        s.process_count = 180;
        Ok(s)
    }
}

#[tokio::test]
async fn cycles_persist_alert_and_publish() {
    let dir = tempfile::tempdir().unwrap();
    let system_log = dir.path().join("logs/system_logs.csv");
    let prediction_log = dir.path().join("logs/prediction_data.csv");
    let sink: Arc<dyn PersistenceSink> =
        Arc::new(CsvSink::new(system_log.clone(), prediction_log.clone()));

    let sent = Arc::new(AtomicUsize::new(0));
    let channel: Box<dyn Notifier> = Box::new(Counter(sent.clone()));
    let alerts = AlertManager::new(
        true,
        Duration::from_secs(300),
        MessageTemplates::default(),
        Dispatcher::new(vec![channel], Duration::from_secs(1)),
    );
    let policy = HealthPolicy::from_file(POLICY).unwrap();
    let predictor = FailurePredictor::new(Strategy::RuleBased, 0.75, sink.clone());
    let analyzer = Analyzer::new(policy, alerts, predictor, true);

    let (mut runner, handle) =
        MonitorRunner::new(HotCpu { step: 0 }, analyzer, sink, Duration::from_secs(60));

    for _ in 0..3 {
        runner.run_cycle().await.unwrap();
    }
    runner.flush().await;

    // cpu critical + ram high: two alerts on the first cycle, then cooldown.
    assert_eq!(sent.load(Ordering::SeqCst), 2);

    let latest = handle.latest_record().unwrap();
    assert_eq!(latest.failure_risk, 55);
    assert_eq!(latest.risk.confidence, 74);
    // 100 - (0.3 * 100 + 0.3 * 50) / 0.6
    assert_eq!(latest.health_score, 25);
    assert!(!latest.suggestions.is_empty());

    let system = std::fs::read_to_string(&system_log).unwrap();
    let lines: Vec<_> = system.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "timestamp,cpu,ram_percent,disk_percent,network_mb_s,temperature,process_count"
    );
    assert_eq!(lines[1], "2024-06-01 09:00:00,92.50,85.00,,,,180");

    let predictions = std::fs::read_to_string(&prediction_log).unwrap();
    let lines: Vec<_> = predictions.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "2024-06-01 09:02:00,rule_based,55,74");
}
