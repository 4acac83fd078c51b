use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}
