//! The monitoring cycle: collect a snapshot, analyze it, publish the result.
//!
//! - [`collector`]: where snapshots come from (`sysinfo` on the live host)
//! - [`analyzer`]: classification, alerting, scoring, risk and suggestions
//!   for one snapshot
//! - [`runner`]: the cancellable periodic loop driving both
//! - [`handle`]: read-only access to the latest result for other tasks

pub mod analyzer;
pub mod collector;
pub mod error;
pub mod handle;
pub mod runner;

pub use analyzer::Analyzer;
pub use collector::{MetricsCollector, SysinfoCollector};
pub use error::{CollectError, MonitorError};
pub use handle::{AnalysisHandle, CycleReport};
pub use runner::MonitorRunner;
