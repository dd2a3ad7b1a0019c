//! Input Validator for Range and Option Checking

use crate::error::ValidationError;
use feature_engine::{CategoricalFamily, CategoryValue, PropertyInput};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
///
/// Ranges are inclusive `(min, max)` pairs. Areas and lengths have no upper
/// bound on the form, so their default maximum is `f64::MAX`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Street frontage (feet)
    pub lot_frontage_range: (f64, f64),
    /// Lot size (sqft)
    pub lot_area_range: (f64, f64),
    /// Masonry veneer area (sqft)
    pub mas_vnr_area_range: (f64, f64),
    /// Finished basement area (sqft)
    pub bsmt_fin_sf1_range: (f64, f64),
    /// First floor area (sqft)
    pub first_flr_sf_range: (f64, f64),
    /// Second floor area (sqft)
    pub second_flr_sf_range: (f64, f64),
    /// Garage capacity (cars)
    pub garage_cars_range: (f64, f64),
    /// Garage area (sqft)
    pub garage_area_range: (f64, f64),
    /// Wood deck area (sqft)
    pub wood_deck_sf_range: (f64, f64),
    /// Open porch area (sqft)
    pub open_porch_sf_range: (f64, f64),
    /// Require every categorical value to be one of the form's options
    pub strict_categories: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let unbounded = (0.0, f64::MAX);
        Self {
            lot_frontage_range: unbounded,
            lot_area_range: unbounded,
            mas_vnr_area_range: unbounded,
            bsmt_fin_sf1_range: unbounded,
            first_flr_sf_range: unbounded,
            second_flr_sf_range: unbounded,
            garage_cars_range: (0.0, 4.0),
            garage_area_range: unbounded,
            wood_deck_sf_range: unbounded,
            open_porch_sf_range: unbounded,
            strict_categories: false,
        }
    }
}

impl ValidationConfig {
    /// Config that also pins categorical values to the form's options
    pub fn strict() -> Self {
        Self {
            strict_categories: true,
            ..Default::default()
        }
    }

    /// Range for a numeric schema column
    pub fn range_for(&self, field: &str) -> Option<(f64, f64)> {
        let range = match field {
            "LotFrontage" => self.lot_frontage_range,
            "LotArea" => self.lot_area_range,
            "MasVnrArea" => self.mas_vnr_area_range,
            "BsmtFinSF1" => self.bsmt_fin_sf1_range,
            "1stFlrSF" => self.first_flr_sf_range,
            "2ndFlrSF" => self.second_flr_sf_range,
            "GarageCars" => self.garage_cars_range,
            "GarageArea" => self.garage_area_range,
            "WoodDeckSF" => self.wood_deck_sf_range,
            "OpenPorchSF" => self.open_porch_sf_range,
            _ => return None,
        };
        Some(range)
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }

    /// Error messages, one per failed field
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

/// Validator for submitted property input
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a numeric schema column against its configured range
    pub fn validate_numeric(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        let range = self.config.range_for(field).unwrap_or((0.0, f64::MAX));
        self.validate_range(field, value, range)
    }

    /// Validate a categorical selection against the form's options
    pub fn validate_category(
        &self,
        family: CategoricalFamily,
        value: &CategoryValue,
    ) -> Result<(), ValidationError> {
        let value = value.to_string();
        if family.options().contains(&value.as_str()) {
            Ok(())
        } else {
            Err(ValidationError::UnknownOption {
                family,
                value,
                allowed: family.options().join(", "),
            })
        }
    }

    /// Validate every field of an input, collecting all failures
    pub fn validate(&self, input: &PropertyInput) -> ValidationResult {
        let mut errors = Vec::new();
        let mut fields_checked = 0;

        for (field, value) in input.numeric_values() {
            fields_checked += 1;
            if let Err(e) = self.validate_numeric(field, value) {
                errors.push(e);
            }
        }

        if self.config.strict_categories {
            for (family, value) in input.selections() {
                fields_checked += 1;
                if let Err(e) = self.validate_category(family, value) {
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            debug!("Input rejected with {} validation errors", errors.len());
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
