//! Moves file appends off the caller's task.
//!
//! A [`QueuedSink`] only enqueues. One writer task drains the queue in
//! submission order and runs each append on the blocking pool, so a slow or
//! stalled filesystem never holds up a monitor cycle.

use std::sync::Arc;
use std::time::Duration;

use hostwatch_core::MetricsSnapshot;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::{PersistenceSink, PredictionRecord};

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

enum Write {
    SystemLog(MetricsSnapshot),
    Prediction(PredictionRecord),
}

impl Write {
    fn kind(&self) -> &'static str {
        match self {
            Write::SystemLog(_) => "system_log",
            Write::Prediction(_) => "prediction",
        }
    }

    fn apply(&self, sink: &dyn PersistenceSink) -> Result<(), StorageError> {
        match self {
            Write::SystemLog(snapshot) => sink.append_system_log(snapshot),
            Write::Prediction(record) => sink.append_prediction(record),
        }
    }
}

/// Non-blocking front for another [`PersistenceSink`].
///
/// A full queue rejects the row with [`StorageError::QueueFull`] instead of
/// waiting. The writer stops once every clone of the sink is dropped and the
/// queue is drained.
#[derive(Clone)]
pub struct QueuedSink {
    tx: mpsc::Sender<Write>,
}

impl QueuedSink {
    /// Start the writer task for `inner`. Must be called within a tokio runtime.
    ///
    /// An append that has not finished after `write_timeout` is logged and
    /// no longer waited for; the writer moves on to the next row.
    pub fn spawn(
        inner: Arc<dyn PersistenceSink>,
        capacity: usize,
        write_timeout: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = tokio::spawn(drain(inner, rx, write_timeout));
        (Self { tx }, writer)
    }

    fn submit(&self, write: Write) -> Result<(), StorageError> {
        self.tx.try_send(write).map_err(|e| match e {
            TrySendError::Full(w) => StorageError::QueueFull(w.kind()),
            TrySendError::Closed(_) => StorageError::Closed,
        })
    }
}

impl PersistenceSink for QueuedSink {
    fn append_system_log(&self, snapshot: &MetricsSnapshot) -> Result<(), StorageError> {
        self.submit(Write::SystemLog(snapshot.clone()))
    }

    fn append_prediction(&self, record: &PredictionRecord) -> Result<(), StorageError> {
        self.submit(Write::Prediction(record.clone()))
    }
}

async fn drain(
    inner: Arc<dyn PersistenceSink>,
    mut rx: mpsc::Receiver<Write>,
    write_timeout: Duration,
) {
    while let Some(write) = rx.recv().await {
        let kind = write.kind();
        let sink = Arc::clone(&inner);
        let job = tokio::task::spawn_blocking(move || write.apply(sink.as_ref()));

        match tokio::time::timeout(write_timeout, job).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(kind, error = %e, "persistence append failed"),
            Ok(Err(e)) => warn!(kind, error = %e, "persistence append panicked"),
            Err(_) => warn!(
                kind,
                timeout_ms = write_timeout.as_millis() as u64,
                "persistence append timed out, moving on"
            ),
        }
    }
    debug!("persistence writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use hostwatch_core::PredictionMode;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl PersistenceSink for Recorder {
        fn append_system_log(&self, s: &MetricsSnapshot) -> Result<(), StorageError> {
            self.0.lock().unwrap().push(format!("system {}", s.process_count));
            Ok(())
        }
        fn append_prediction(&self, r: &PredictionRecord) -> Result<(), StorageError> {
            self.0.lock().unwrap().push(format!("prediction {}", r.failure_probability));
            Ok(())
        }
    }

    /// Every append blocks until the test drops the release side.
    struct Stalled(Mutex<std_mpsc::Receiver<()>>);

    impl PersistenceSink for Stalled {
        fn append_system_log(&self, _s: &MetricsSnapshot) -> Result<(), StorageError> {
            let _ = self.0.lock().unwrap().recv();
            Ok(())
        }
        fn append_prediction(&self, _r: &PredictionRecord) -> Result<(), StorageError> {
            let _ = self.0.lock().unwrap().recv();
            Ok(())
        }
    }

    fn snapshot(process_count: u64) -> MetricsSnapshot {
        let mut s = MetricsSnapshot::empty(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        s.process_count = process_count;
        s
    }

    fn prediction(p: u8) -> PredictionRecord {
        PredictionRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            mode: PredictionMode::RuleBased,
            failure_probability: p,
            confidence: 60,
        }
    }

    #[tokio::test]
    async fn rows_are_written_in_submission_order() {
        let recorder = Arc::new(Recorder::default());
        let (sink, writer) = QueuedSink::spawn(recorder.clone(), 8, DEFAULT_WRITE_TIMEOUT);

        sink.append_system_log(&snapshot(1)).unwrap();
        sink.append_prediction(&prediction(40)).unwrap();
        sink.append_system_log(&snapshot(2)).unwrap();
        drop(sink);
        writer.await.unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["system 1", "prediction 40", "system 2"]
        );
    }

    #[tokio::test]
    async fn full_queue_rejects_instead_of_waiting() {
        let recorder = Arc::new(Recorder::default());
        let (sink, writer) = QueuedSink::spawn(recorder.clone(), 1, DEFAULT_WRITE_TIMEOUT);

        // The writer has not been polled yet, so the one slot stays taken.
        sink.append_system_log(&snapshot(1)).unwrap();
        let err = sink.append_prediction(&prediction(10)).unwrap_err();
        assert!(matches!(err, StorageError::QueueFull("prediction")));

        drop(sink);
        writer.await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec!["system 1"]);
    }

    #[tokio::test]
    async fn stalled_disk_does_not_wedge_the_writer() {
        let (release, gate) = std_mpsc::channel::<()>();
        let (sink, writer) = QueuedSink::spawn(
            Arc::new(Stalled(Mutex::new(gate))),
            8,
            Duration::from_millis(50),
        );

        sink.append_system_log(&snapshot(1)).unwrap();
        sink.append_system_log(&snapshot(2)).unwrap();
        drop(sink);

        // Both appends hang; the writer gives up on each and exits.
        let finished = tokio::time::timeout(Duration::from_secs(5), writer).await;
        assert!(finished.is_ok());
        drop(release);
    }

    #[tokio::test]
    async fn closed_writer_is_reported() {
        let (sink, writer) = QueuedSink::spawn(Arc::new(Recorder::default()), 8, DEFAULT_WRITE_TIMEOUT);
        writer.abort();
        let _ = writer.await;
        let err = sink.append_system_log(&snapshot(1)).unwrap_err();
        assert!(matches!(err, StorageError::Closed));
    }
}
