use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feature shape mismatch: expected {expected}, got {got}")]
    Shape { expected: usize, got: usize },

    #[error("inference failed: {0}")]
    Inference(String),
}
