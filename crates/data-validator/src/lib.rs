//! Property Input Validation
//!
//! Enforces the bounds and option lists of the input form on every submission,
//! whichever surface it arrived through.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig, ValidationResult};
