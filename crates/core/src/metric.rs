//! Metric identities, severity tiers, and the per-cycle host snapshot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HostwatchError;

// ── Metric identity ─────────────────────────────────────────────

/// Host metrics the monitor knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Ram,
    Disk,
    Network,
    Temperature,
    ProcessCount,
    LoadAverage,
}

impl MetricKind {
    /// Every metric, in the fixed order used for feature vectors and reports.
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Cpu,
        MetricKind::Ram,
        MetricKind::Disk,
        MetricKind::Network,
        MetricKind::Temperature,
        MetricKind::ProcessCount,
        MetricKind::LoadAverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Ram => "ram",
            MetricKind::Disk => "disk",
            MetricKind::Network => "network",
            MetricKind::Temperature => "temperature",
            MetricKind::ProcessCount => "process_count",
            MetricKind::LoadAverage => "load_average",
        }
    }

    /// Position of this metric in [`MetricKind::ALL`].
    pub fn slot(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = HostwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| HostwatchError::UnknownMetric(s.to_string()))
    }
}

// ── Severity ────────────────────────────────────────────────────

/// Ordinal classification of a metric value. `Normal < Warning < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Ordinal severity 0–3.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Severity::Normal)
    }

    pub fn priority(&self) -> Priority {
        match self {
            Severity::Normal => Priority::Low,
            Severity::Warning => Priority::Medium,
            Severity::High => Priority::High,
            Severity::Critical => Priority::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert priority derived from a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Classified metric ───────────────────────────────────────────

/// A raw metric value paired with its resolved tier for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMetric {
    pub metric: MetricKind,
    pub value: f64,
    pub tier: Severity,
}

// ── Snapshot ────────────────────────────────────────────────────

/// Usage of a capacity-bounded resource (memory, root filesystem).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

/// Network throughput since the previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkUsage {
    pub upload_mb_s: f64,
    pub download_mb_s: f64,
}

impl NetworkUsage {
    pub fn total_mb_s(&self) -> f64 {
        self.upload_mb_s + self.download_mb_s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// One sample of host resources. Absent fields mean the platform could not
/// report that metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: Option<f64>,
    pub ram: Option<UsageStats>,
    pub disk: Option<UsageStats>,
    pub network: Option<NetworkUsage>,
    pub temperature: Option<f64>,
    pub process_count: u64,
    pub load_average: Option<LoadAverage>,
}

impl MetricsSnapshot {
    /// An empty snapshot: every optional metric absent, zero processes.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu: None,
            ram: None,
            disk: None,
            network: None,
            temperature: None,
            process_count: 0,
            load_average: None,
        }
    }

    /// The scalar value classified for `kind`, or `None` when absent.
    ///
    /// Network is upload + download, load average uses the 1-minute value.
    pub fn value_of(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Cpu => self.cpu,
            MetricKind::Ram => self.ram.map(|r| r.percent),
            MetricKind::Disk => self.disk.map(|d| d.percent),
            MetricKind::Network => self.network.map(|n| n.total_mb_s()),
            MetricKind::Temperature => self.temperature,
            MetricKind::ProcessCount => Some(self.process_count as f64),
            MetricKind::LoadAverage => self.load_average.map(|l| l.one),
        }
    }
}
