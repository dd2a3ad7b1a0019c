//! Price Prediction Pipeline

use crate::artifact::{load_model, load_scaler, ArtifactPaths};
use crate::forest::{Aggregation, DecisionTree, TreeEnsemble};
use crate::scaler::StandardScaler;
use crate::{FeatureScaler, InferenceError, Regressor};
use feature_engine::{schema, EncodedRow, Encoder, PropertyInput, UnmatchedCategoryPolicy, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Predicted sale price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePrediction {
    /// Estimated price in dollars
    pub price: f64,
    /// Timestamp when prediction was made
    pub timestamp_ms: u64,
}

/// Result of one pipeline pass
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: PricePrediction,
    /// The encoded row handed to the scaler
    pub row: EncodedRow,
    /// Pipeline latency in microseconds
    pub latency_us: u64,
}

/// Encoder, scaler and regressor wired into one synchronous pipeline
///
/// Artifacts are shared read-only; a single predictor serves every request.
#[derive(Clone)]
pub struct PricePredictor {
    encoder: Encoder,
    scaler: Arc<dyn FeatureScaler>,
    regressor: Arc<dyn Regressor>,
}

impl PricePredictor {
    /// Create a predictor from already-loaded components
    pub fn new(
        encoder: Encoder,
        scaler: Arc<dyn FeatureScaler>,
        regressor: Arc<dyn Regressor>,
    ) -> Self {
        Self {
            encoder,
            scaler,
            regressor,
        }
    }

    /// Load both artifacts from disk
    pub fn load(paths: &ArtifactPaths, policy: UnmatchedCategoryPolicy) -> Result<Self, InferenceError> {
        info!(
            "Loading artifacts: scaler={}, model={}",
            paths.scaler_path.display(),
            paths.model_path.display()
        );
        let scaler = load_scaler(&paths.scaler_path)?;
        let model = load_model(&paths.model_path)?;

        Ok(Self::new(Encoder::new(policy), Arc::new(scaler), Arc::new(model)))
    }

    /// Create a mock predictor for development and testing
    ///
    /// Identity scaling and two stumps: one on first-floor area, one on garage
    /// capacity. The form defaults predict $205,000.00.
    pub fn mock() -> Self {
        info!("Creating mock price predictor");
        let first_floor = schema::index_of("1stFlrSF").unwrap_or(4);
        let garage_cars = schema::index_of("GarageCars").unwrap_or(6);
        let trees = vec![
            DecisionTree::stump(first_floor, 1200.0, 150_000.0, 210_000.0),
            DecisionTree::stump(garage_cars, 1.5, 160_000.0, 200_000.0),
        ];
        let model = TreeEnsemble::from_parts(FEATURE_COUNT, trees, Aggregation::Mean);

        Self::new(
            Encoder::default(),
            Arc::new(StandardScaler::identity(FEATURE_COUNT)),
            Arc::new(model),
        )
    }

    /// Run one input through encode, scale and predict
    pub fn predict(&self, input: &PropertyInput) -> Result<InferenceResult, InferenceError> {
        let start = std::time::Instant::now();

        let row = self.encoder.encode(input)?;
        let scaled = self.scaler.transform(row.as_slice())?;
        let price = self.regressor.predict(&scaled)?;

        if !price.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "model returned non-finite price {}",
                price
            )));
        }

        let latency_us = start.elapsed().as_micros() as u64;
        debug!("Predicted {:.2} in {}us", price, latency_us);

        let timestamp_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Ok(InferenceResult {
            prediction: PricePrediction {
                price,
                timestamp_ms,
            },
            row,
            latency_us,
        })
    }
}
