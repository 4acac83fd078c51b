//! Append-only persistence for host snapshots and risk predictions.
//!
//! Writes are fire-and-forget from the monitor's point of view: callers log
//! a returned [`StorageError`] and carry on. With persistence enabled the
//! file writes themselves happen on a background writer (see [`queued`]).

pub mod csv;
pub mod error;
pub mod queued;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hostwatch_core::config::StorageConfig;
use hostwatch_core::{MetricsSnapshot, PredictionMode, RiskEstimate};

pub use crate::csv::CsvSink;
pub use error::StorageError;
pub use queued::QueuedSink;

/// One line of the prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: PredictionMode,
    pub failure_probability: u8,
    pub confidence: u8,
}

impl PredictionRecord {
    pub fn from_estimate(estimate: &RiskEstimate, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            mode: estimate.mode,
            failure_probability: estimate.probability,
            confidence: estimate.confidence,
        }
    }
}

/// Persistence contract consumed by the monitor and the failure predictor.
pub trait PersistenceSink: Send + Sync {
    fn append_system_log(&self, snapshot: &MetricsSnapshot) -> Result<(), StorageError>;

    fn append_prediction(&self, record: &PredictionRecord) -> Result<(), StorageError>;
}

/// Discards everything. Used when persistence is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PersistenceSink for NullSink {
    fn append_system_log(&self, _snapshot: &MetricsSnapshot) -> Result<(), StorageError> {
        Ok(())
    }

    fn append_prediction(&self, _record: &PredictionRecord) -> Result<(), StorageError> {
        Ok(())
    }
}

/// The sink selected by config plus the writer task behind it, if any.
pub struct Persistence {
    sink: Arc<dyn PersistenceSink>,
    writer: Option<tokio::task::JoinHandle<()>>,
}

impl Persistence {
    /// CSV files under `data_dir` behind a [`QueuedSink`], or [`NullSink`].
    ///
    /// Must be called within a tokio runtime when persistence is enabled.
    pub fn from_config(config: &StorageConfig) -> Self {
        if config.persistence_enabled {
            tracing::info!(data_dir = %config.data_dir.display(), "persistence: csv sink");
            let (sink, writer) = QueuedSink::spawn(
                Arc::new(CsvSink::from_config(config)),
                queued::DEFAULT_QUEUE_CAPACITY,
                queued::DEFAULT_WRITE_TIMEOUT,
            );
            Self {
                sink: Arc::new(sink),
                writer: Some(writer),
            }
        } else {
            tracing::info!("persistence disabled");
            Self {
                sink: Arc::new(NullSink),
                writer: None,
            }
        }
    }

    pub fn sink(&self) -> Arc<dyn PersistenceSink> {
        Arc::clone(&self.sink)
    }

    /// Wait up to `grace` for queued rows to reach disk.
    ///
    /// Every clone handed out by [`Persistence::sink`] must be dropped first,
    /// otherwise the writer keeps waiting for more rows until `grace` runs out.
    pub async fn close(self, grace: Duration) {
        let Self { sink, writer } = self;
        drop(sink);
        let Some(writer) = writer else {
            return;
        };
        match tokio::time::timeout(grace, writer).await {
            Ok(Ok(())) => tracing::debug!("persistence flushed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "persistence writer failed"),
            Err(_) => tracing::warn!(
                grace_secs = grace.as_secs(),
                "persistence writer still busy at shutdown, queued rows may be lost"
            ),
        }
    }
}
