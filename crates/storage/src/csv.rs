//! CSV file sink: `system_logs.csv` and `prediction_data.csv`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hostwatch_core::config::StorageConfig;
use hostwatch_core::MetricsSnapshot;

use crate::error::StorageError;
use crate::{PersistenceSink, PredictionRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SYSTEM_LOG_HEADERS: [&str; 7] = [
    "timestamp",
    "cpu",
    "ram_percent",
    "disk_percent",
    "network_mb_s",
    "temperature",
    "process_count",
];

pub const PREDICTION_HEADERS: [&str; 4] =
    ["timestamp", "mode", "failure_probability", "confidence"];

/// Appends rows to two CSV files, creating each (with its header) on first write.
#[derive(Debug)]
pub struct CsvSink {
    system_log: PathBuf,
    prediction_log: PathBuf,
    // Serializes appends so rows from concurrent writers never interleave.
    write_lock: Mutex<()>,
}

impl CsvSink {
    pub fn new(system_log: impl Into<PathBuf>, prediction_log: impl Into<PathBuf>) -> Self {
        Self {
            system_log: system_log.into(),
            prediction_log: prediction_log.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.system_log_path(), config.prediction_log_path())
    }

    pub fn system_log_path(&self) -> &Path {
        &self.system_log
    }

    pub fn prediction_log_path(&self) -> &Path {
        &self.prediction_log
    }

    fn append_row(&self, path: &Path, headers: &[&str], row: &[String]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if is_new {
            writeln!(file, "{}", headers.join(","))?;
            tracing::info!(path = %path.display(), "created new CSV file");
        }
        writeln!(file, "{}", row.join(","))?;
        Ok(())
    }
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

impl PersistenceSink for CsvSink {
    fn append_system_log(&self, snapshot: &MetricsSnapshot) -> Result<(), StorageError> {
        let row = [
            snapshot.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            opt(snapshot.cpu),
            opt(snapshot.ram.map(|r| r.percent)),
            opt(snapshot.disk.map(|d| d.percent)),
            opt(snapshot.network.map(|n| n.total_mb_s())),
            opt(snapshot.temperature),
            snapshot.process_count.to_string(),
        ];
        self.append_row(&self.system_log, &SYSTEM_LOG_HEADERS, &row)
    }

    fn append_prediction(&self, record: &PredictionRecord) -> Result<(), StorageError> {
        let row = [
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.mode.to_string(),
            record.failure_probability.to_string(),
            record.confidence.to_string(),
        ];
        self.append_row(&self.prediction_log, &PREDICTION_HEADERS, &row)
    }
}
