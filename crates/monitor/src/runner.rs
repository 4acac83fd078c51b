//! Periodic monitoring loop.

use std::sync::Arc;
use std::time::Duration;

use hostwatch_storage::PersistenceSink;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::analyzer::Analyzer;
use crate::collector::MetricsCollector;
use crate::error::CollectError;
use crate::handle::{AnalysisHandle, CycleReport, Publisher};

/// Drives collect → persist → analyze → publish at a fixed interval.
pub struct MonitorRunner<C> {
    collector: C,
    analyzer: Analyzer,
    sink: Arc<dyn PersistenceSink>,
    interval: Duration,
    publisher: Publisher,
}

impl<C: MetricsCollector> MonitorRunner<C> {
    /// Build a runner and the handle readers use to see its results.
    pub fn new(
        collector: C,
        analyzer: Analyzer,
        sink: Arc<dyn PersistenceSink>,
        interval: Duration,
    ) -> (Self, AnalysisHandle) {
        let (publisher, handle) = AnalysisHandle::channel();
        let runner = Self {
            collector,
            analyzer,
            sink,
            interval,
            publisher,
        };
        (runner, handle)
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Run one cycle and publish its report.
    ///
    /// Only collection can fail; everything after it degrades and logs.
    /// Alerts raised by the cycle may still be in delivery when it returns.
    pub async fn run_cycle(&mut self) -> Result<Arc<CycleReport>, CollectError> {
        let snapshot = self.collector.collect().await?;

        if let Err(e) = self.sink.append_system_log(&snapshot) {
            warn!(error = %e, "failed to append system log");
        }

        let record = self.analyzer.analyze(&snapshot).await;
        let report = Arc::new(CycleReport { snapshot, record });
        self.publisher.send_replace(Some(report.clone()));
        Ok(report)
    }

    /// Wait for alert deliveries started by earlier cycles.
    pub async fn flush(&mut self) {
        self.analyzer.flush_alerts().await;
    }

    /// Loop until `shutdown` turns `true` or its sender is dropped.
    ///
    /// A cycle already in progress runs to completion before the loop exits,
    /// then pending alert deliveries are given their channel timeout to finish.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs_f64(), "monitor started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        warn!(error = %e, "monitor cycle skipped");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.flush().await;
        info!("monitor stopped");
    }
}
