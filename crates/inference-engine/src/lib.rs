//! Price Inference Engine
//!
//! Applies the fitted scaler and tree-ensemble regressor to encoded property
//! rows. Both artifacts sit behind traits so the pipeline can run against
//! deterministic fakes.

pub mod artifact;
mod engine;
pub mod forest;
mod scaler;

pub use artifact::ArtifactPaths;
pub use engine::{InferenceResult, PricePrediction, PricePredictor};
pub use forest::{Aggregation, DecisionTree, TreeEnsemble};
pub use scaler::StandardScaler;

use feature_engine::FeatureError;
use std::path::PathBuf;
use thiserror::Error;

/// Fitted column-wise transform applied before prediction
pub trait FeatureScaler: Send + Sync {
    /// Transform one row; the result has the same width
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// Fitted regression model producing one value per row
pub trait Regressor: Send + Sync {
    /// Predict for one scaled row
    fn predict(&self, row: &[f64]) -> Result<f64, InferenceError>;
}

/// Errors while reading or checking a fitted artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid artifact: {0}")]
    Invalid(String),
    #[error("Artifact columns do not match feature schema: {0}")]
    SchemaMismatch(String),
}

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(#[from] ArtifactError),
    #[error("Feature encoding failed: {0}")]
    Encoding(#[from] FeatureError),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
}
