use thiserror::Error;

use hostwatch_notify::NotifyError;
use hostwatch_rules::PolicyError;

/// Failure to take a host snapshot. The cycle is skipped, the loop continues.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("metric collection task failed: {0}")]
    Task(String),

    #[error("collector state poisoned")]
    Poisoned,

    #[error("{0}")]
    Other(String),
}

/// Errors building the monitor at startup.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("health policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("alerting: {0}")]
    Notify(#[from] NotifyError),
}
