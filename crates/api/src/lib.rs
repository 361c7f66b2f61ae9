//! Gradebook API Server
//!
//! REST API over the result store, plus a grade preview endpoint for the
//! entry form.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use grading::{GradeCalculator, Validator};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use storage::{ResultRepository, StorageError, StoreStats};
use tokio::net::TcpListener;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

pub mod caller;
pub mod config;
pub mod error;
pub mod extract;
pub mod rate_limit;
pub mod routes;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::ApiError;
pub use telemetry::{init_logging, init_metrics};

/// Application state shared across handlers
pub struct AppState {
    /// Result store
    pub repository: Arc<ResultRepository>,
    pub calculator: GradeCalculator,
    pub validator: Validator,
    /// Check caller-supplied total/average/grade on addResult
    pub verify_derived: bool,
    /// Prometheus handle when the exporter is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state with an empty store and default thresholds
    pub fn new() -> Self {
        Self::with_repository(Arc::new(ResultRepository::new()), &ServerConfig::default())
    }

    pub fn with_repository(repository: Arc<ResultRepository>, config: &ServerConfig) -> Self {
        Self {
            repository,
            calculator: GradeCalculator::new(config.grading.clone()),
            validator: Validator::new(config.validation.clone()),
            verify_derived: config.verify_derived,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Store statistics
#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub record_count: usize,
    pub next_id: u64,
    pub verify_derived: bool,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/results",
            get(routes::results::get_results)
                .post(routes::results::add_result)
                .delete(routes::results::clear_all),
        )
        .route("/api/v1/results/:id", delete(routes::results::delete_result))
        .route("/api/v1/grade", post(routes::grade::preview_grade))
        .route("/metrics", get(routes::metrics::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, body) = health_report(&state, state.repository.stats());
    (status, Json(body))
}

/// Healthy with store statistics, or 503 `degraded` when the store cannot
/// be read
fn health_report(
    state: &AppState,
    stats: Result<StoreStats, StorageError>,
) -> (StatusCode, HealthResponse) {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut body = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: None,
        error: None,
    };

    match stats {
        Ok(stats) => {
            body.store = Some(StoreHealth {
                record_count: stats.records,
                next_id: stats.next_id,
                verify_derived: state.verify_derived,
            });
            (StatusCode::OK, body)
        }
        Err(e) => {
            error!("Health check could not read the store: {e}");
            body.status = "degraded".to_string();
            body.error = Some(e.to_string());
            (StatusCode::SERVICE_UNAVAILABLE, body)
        }
    }
}

/// Bind the configured address and run until Ctrl-C or SIGTERM
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.bind_addr).await?;
    serve_until(listener, config, shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves, then write the snapshot
/// if one is configured
pub async fn serve_until<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let repository = match &config.snapshot_path {
        Some(path) => Arc::new(ResultRepository::load_snapshot(path).await?),
        None => {
            info!("Snapshot persistence disabled, results live in memory only");
            Arc::new(ResultRepository::new())
        }
    };

    let mut state = AppState::with_repository(Arc::clone(&repository), &config);
    state.metrics = init_metrics(&config);
    let mut app = create_router(Arc::new(state));

    if config.rate_limit.enabled {
        match rate_limit::create_governor_config(&config.rate_limit) {
            Some(governor) => {
                info!(
                    "Rate limiting enabled: burst {}, one request per {}s",
                    config.rate_limit.burst_size, config.rate_limit.per_second
                );
                app = app.layer(GovernorLayer { config: governor });
            }
            None => warn!("Invalid rate limit settings {:?}, rate limiting disabled", config.rate_limit),
        }
    }

    info!("Starting API server on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    if let Some(path) = &config.snapshot_path {
        repository.save_snapshot(path).await?;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        () = wait_ctrl_c() => info!("Received Ctrl+C signal"),
        () = wait_sigterm() => info!("Received SIGTERM signal"),
    }
    info!("Shutdown signal received, draining connections");
}

async fn wait_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Error handling Ctrl+C signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_sigterm() {
    std::future::pending::<()>().await
}
