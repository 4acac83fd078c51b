//! Errors raised while loading or validating a health policy.

/// Errors that can occur during policy loading.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Policy validation error (unordered tiers, negative weights, ...).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
