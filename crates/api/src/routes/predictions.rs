//! Prediction Routes

use axum::{extract::State, Json};
use feature_engine::{schema, CategoricalFamily, PropertyInput};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::format::format_usd;
use crate::SharedState;

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub price: f64,
    pub formatted: String,
    pub timestamp_ms: u64,
    pub latency_us: u64,
    /// Numeric inputs as submitted
    pub inputs: BTreeMap<&'static str, f64>,
    /// `{family}_{value}` keys of the submitted selections
    pub categorical_features: Vec<String>,
    /// Indicator columns set in the encoded row
    pub active_indicators: Vec<&'static str>,
}

/// A categorical family and the options the form offers
#[derive(Debug, Serialize)]
pub struct FamilySchema {
    pub name: &'static str,
    pub options: &'static [&'static str],
}

/// Response for the schema endpoint
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub feature_count: usize,
    pub features: &'static [&'static str],
    pub numeric: &'static [&'static str],
    pub categorical: Vec<FamilySchema>,
}

/// Predict a price from JSON input
pub async fn predict(
    State(state): State<SharedState>,
    Json(input): Json<PropertyInput>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let result = state.predict(&input)?;

    Ok(Json(PredictionResponse {
        price: result.prediction.price,
        formatted: format_usd(result.prediction.price),
        timestamp_ms: result.prediction.timestamp_ms,
        latency_us: result.latency_us,
        inputs: input.numeric_values().into_iter().collect(),
        categorical_features: input.indicator_keys(),
        active_indicators: result.row.active_indicators(),
    }))
}

/// Describe the canonical feature schema
pub async fn get_schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        feature_count: schema::FEATURE_COUNT,
        features: schema::feature_names(),
        numeric: &schema::NUMERIC_FEATURES,
        categorical: CategoricalFamily::ALL
            .iter()
            .map(|family| FamilySchema {
                name: family.prefix(),
                options: family.options(),
            })
            .collect(),
    })
}
