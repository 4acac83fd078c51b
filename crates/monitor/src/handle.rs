use std::sync::Arc;

use hostwatch_core::{AnalysisRecord, MetricsSnapshot, RiskEstimate};
use serde::Serialize;
use tokio::sync::watch;

/// Snapshot and analysis of one completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub snapshot: MetricsSnapshot,
    pub record: AnalysisRecord,
}

pub(crate) type Publisher = watch::Sender<Option<Arc<CycleReport>>>;

/// Cheap, cloneable read access to the latest [`CycleReport`].
///
/// Readers get an `Arc` to an immutable report; the monitor swaps in a new
/// one each cycle and never blocks on readers.
#[derive(Debug, Clone)]
pub struct AnalysisHandle {
    rx: watch::Receiver<Option<Arc<CycleReport>>>,
}

impl AnalysisHandle {
    pub(crate) fn channel() -> (Publisher, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self { rx })
    }

    /// `None` until the first cycle completes.
    pub fn latest(&self) -> Option<Arc<CycleReport>> {
        self.rx.borrow().clone()
    }

    pub fn latest_record(&self) -> Option<AnalysisRecord> {
        self.latest().map(|r| r.record.clone())
    }

    pub fn latest_snapshot(&self) -> Option<MetricsSnapshot> {
        self.latest().map(|r| r.snapshot.clone())
    }

    pub fn latest_risk(&self) -> Option<RiskEstimate> {
        self.rx.borrow().as_ref().map(|r| r.record.risk)
    }

    /// Wait for the next published report. Returns `None` once the monitor is gone.
    pub async fn next(&mut self) -> Option<Arc<CycleReport>> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}
