//! Feature Engineering Engine
//!
//! Canonical feature schema and one-hot encoding of property input into the
//! fixed-width row the fitted scaler and model expect.

mod encoder;
mod input;
pub mod schema;

pub use encoder::{EncodedRow, Encoder, UnmatchedCategoryPolicy};
pub use input::{CategoryValue, PropertyInput};
pub use schema::{CategoricalFamily, FEATURE_COUNT, FEATURE_NAMES, NUMERIC_FEATURES};

use thiserror::Error;

/// Errors during feature encoding
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Unknown {family} value '{value}': no matching column in feature schema")]
    UnknownCategory {
        family: CategoricalFamily,
        value: String,
    },
    #[error("Column not in feature schema: {0}")]
    UnknownColumn(String),
}
