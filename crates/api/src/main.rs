//! House Price Prediction Server - Main Entry Point

use anyhow::Context;
use api::{
    init_logging, run_server, spawn_metrics_upkeep, AppConfig, AppState, METRICS_UPKEEP_INTERVAL,
};
use data_validator::Validator;
use inference_engine::PricePredictor;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("=== House Price Prediction v{} ===", env!("CARGO_PKG_VERSION"));

    let predictor = match PricePredictor::load(&config.artifacts, config.encoding.unmatched_category) {
        Ok(predictor) => predictor,
        Err(e) => {
            error!("Cannot start without model artifacts: {}", e);
            std::process::exit(1);
        }
    };

    let mut state = AppState::new(predictor, Validator::new(config.validation.clone()));
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            spawn_metrics_upkeep(handle.clone(), METRICS_UPKEEP_INTERVAL);
            state = state.with_metrics(handle);
        }
        Err(e) => warn!("Metrics exporter unavailable: {}", e),
    }

    run_server(&config, Arc::new(state))
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
