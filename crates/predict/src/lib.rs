//! Failure-risk estimation.
//!
//! Two strategies sit behind [`FailurePredictor`]: a fixed-increment rule
//! scorer that is always available, and a learned classifier loaded from a
//! JSON file. Any failure of the learned path collapses to the rule scorer.

pub mod error;
pub mod features;
pub mod model;
pub mod predictor;
pub mod rule_based;

pub use error::ModelError;
pub use features::{FeatureVector, FEATURE_COUNT};
pub use model::{load_model, FailureModel, ModelOutput, SerializedModel};
pub use predictor::{FailurePredictor, Strategy};
pub use rule_based::{rule_based_estimate, tier_increment};
