//! House Price Prediction Web Service
//!
//! HTML form and JSON API over the encode, scale and predict pipeline.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use data_validator::Validator;
use feature_engine::PropertyInput;
use inference_engine::{InferenceResult, PricePredictor};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, trace, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod format;
pub mod pages;
pub mod rate_limit;
mod routes;

pub use config::{AppConfig, LoggingConfig};
pub use error::ApiError;

/// Shared handle to the application state
pub type SharedState = Arc<AppState>;

/// Application state shared across handlers
pub struct AppState {
    /// Loaded pipeline
    pub predictor: PricePredictor,
    /// Input checks applied before encoding
    pub validator: Validator,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Successful predictions served
    pub prediction_count: AtomicU64,
    /// Requests that failed validation or inference
    pub error_count: AtomicU64,
    /// Prometheus exposition, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(predictor: PricePredictor, validator: Validator) -> Self {
        Self {
            predictor,
            validator,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            prediction_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Attach the Prometheus handle served at `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Validate then run one input through the pipeline
    pub fn predict(&self, input: &PropertyInput) -> Result<InferenceResult, ApiError> {
        let outcome = self.run_pipeline(input);
        match &outcome {
            Ok(result) => {
                self.prediction_count.fetch_add(1, Ordering::Relaxed);
                counter!("house_price_predictions_total").increment(1);
                histogram!("house_price_inference_latency_us").record(result.latency_us as f64);
            }
            Err(e) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                counter!("house_price_prediction_errors_total", "kind" => e.kind()).increment(1);
                warn!("Prediction rejected ({}): {}", e.kind(), e.messages().join("; "));
            }
        }
        outcome
    }

    fn run_pipeline(&self, input: &PropertyInput) -> Result<InferenceResult, ApiError> {
        let validation = self.validator.validate(input);
        if !validation.valid {
            return Err(ApiError::Validation(validation.messages()));
        }
        Ok(self.predictor.predict(input)?)
    }
}

/// Period of the metrics upkeep task
pub const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Render the recorder every `period`, folding buffered histogram samples
/// into their summaries whether or not `/metrics` is scraped
pub fn spawn_metrics_upkeep(handle: PrometheusHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let rendered = handle.render();
            trace!("Metrics upkeep rendered {} bytes", rendered.len());
        }
    })
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub prediction_count: u64,
    pub error_count: u64,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::form::show_form))
        .route("/predict", post(routes::form::submit_form))
        .route("/api/v1/predict", post(routes::predictions::predict))
        .route("/api/v1/schema", get(routes::predictions::get_schema))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(routes::metrics::get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        prediction_count: state.prediction_count.load(Ordering::Relaxed),
        error_count: state.error_count.load(Ordering::Relaxed),
    })
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level: Level = config.level.parse()?;

    if config.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

/// Serve the router on an already-bound listener
pub async fn serve(
    listener: tokio::net::TcpListener,
    config: &AppConfig,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut app = create_router(state);

    let limits = &config.server.rate_limit;
    if limits.enabled {
        match rate_limit::create_governor_config(limits) {
            Some(governor) => app = app.layer(GovernorLayer { config: governor }),
            None => warn!("Rate limiting disabled: invalid limits {:?}", limits),
        }
    }

    info!("Listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Bind the configured address and run the server
pub async fn run_server(
    config: &AppConfig,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    serve(listener, config, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use data_validator::ValidationConfig;
    use feature_engine::{Encoder, UnmatchedCategoryPolicy};
    use inference_engine::StandardScaler;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn mock_state() -> SharedState {
        Arc::new(AppState::new(PricePredictor::mock(), Validator::default()))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_body(input: &PropertyInput) -> String {
        let value = serde_json::to_value(input).unwrap();
        value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{}={}", k, text)
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_form_page() {
        let response = create_router(mock_state())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<form method=\"post\" action=\"/predict\">"));
        assert!(!page.contains("Predicted house price"));
    }

    #[tokio::test]
    async fn test_form_submission_shows_price() {
        let state = mock_state();
        let response = create_router(state.clone())
            .oneshot(
                Request::post("/predict")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form_body(&PropertyInput::default())))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<strong>$205,000.00</strong>"));
        assert_eq!(state.prediction_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_form_submission_with_invalid_input() {
        let input = PropertyInput {
            garage_cars: 9.0,
            ..Default::default()
        };
        let response = create_router(mock_state())
            .oneshot(
                Request::post("/predict")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form_body(&input)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let page = body_text(response).await;
        assert!(page.contains("class=\"errors\""));
        assert!(page.contains("GarageCars"));
    }

    #[tokio::test]
    async fn test_json_predict() {
        let body = serde_json::to_value(PropertyInput::default()).unwrap();
        let response = create_router(mock_state())
            .oneshot(json_request("/api/v1/predict", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["price"], 205_000.0);
        assert_eq!(json["formatted"], "$205,000.00");
        assert_eq!(json["inputs"]["GarageCars"], 2.0);
        assert_eq!(json["categorical_features"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_json_predict_validation_error() {
        let mut body = serde_json::to_value(PropertyInput::default()).unwrap();
        body["GarageCars"] = serde_json::json!(9);
        let state = mock_state();
        let response = create_router(state.clone())
            .oneshot(json_request("/api/v1/predict", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "Invalid property input");
        assert_eq!(json["details"].as_array().unwrap().len(), 1);
        assert_eq!(state.error_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_reject_policy_returns_unprocessable() {
        let predictor = PricePredictor::new(
            Encoder::new(UnmatchedCategoryPolicy::Reject),
            Arc::new(StandardScaler::identity(feature_engine::FEATURE_COUNT)),
            Arc::new(
                inference_engine::TreeEnsemble::new(
                    feature_engine::FEATURE_COUNT,
                    vec![inference_engine::DecisionTree::leaf(1.0)],
                    inference_engine::Aggregation::Mean,
                )
                .unwrap(),
            ),
        );
        let state = Arc::new(AppState::new(predictor, Validator::default()));

        let mut body = serde_json::to_value(PropertyInput::default()).unwrap();
        body["SaleType"] = serde_json::json!("ConLD");
        let response = create_router(state)
            .oneshot(json_request("/api/v1/predict", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_strict_validation_rejects_unknown_option() {
        let state = Arc::new(AppState::new(
            PricePredictor::mock(),
            Validator::new(ValidationConfig::strict()),
        ));
        let mut body = serde_json::to_value(PropertyInput::default()).unwrap();
        body["Fireplaces"] = serde_json::json!(7);
        let response = create_router(state)
            .oneshot(json_request("/api/v1/predict", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(mock_state())
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["prediction_count"], 0);
    }

    #[tokio::test]
    async fn test_schema() {
        let response = create_router(mock_state())
            .oneshot(Request::get("/api/v1/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["feature_count"], 55);
        assert_eq!(json["features"].as_array().unwrap().len(), 55);
        assert_eq!(json["categorical"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = create_router(mock_state())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_upkeep_keeps_totals() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let state = mock_state();
        let upkeep = spawn_metrics_upkeep(handle.clone(), Duration::from_millis(10));

        for _ in 0..3 {
            metrics::with_local_recorder(&recorder, || {
                for _ in 0..100 {
                    state.predict(&PropertyInput::default()).unwrap();
                }
            });
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        let rendered = handle.render();
        assert!(rendered.contains("house_price_predictions_total 300"));
        assert!(rendered.contains("house_price_inference_latency_us_count 300"));
        assert!(!upkeep.is_finished());
        upkeep.abort();
    }

    #[test]
    fn test_invalid_log_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            json: false,
        };
        assert!(init_logging(&config).is_err());
    }
}
