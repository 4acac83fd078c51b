use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink lock poisoned")]
    Poisoned,

    #[error("write queue full, {0} row dropped")]
    QueueFull(&'static str),

    #[error("persistence writer has stopped")]
    Closed,

    #[error("{0}")]
    Other(String),
}
