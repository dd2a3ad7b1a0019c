//! Validation Error Types

use feature_engine::CategoricalFamily;
use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite numeric value
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    /// Selection not offered by the form
    #[error("{family} value '{value}' is not one of: {allowed}")]
    UnknownOption {
        family: CategoricalFamily,
        value: String,
        allowed: String,
    },
}
