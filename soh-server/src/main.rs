//! EV Battery Health - Prediction Server
//!
//! HTTP front for the SOH engine plus the vehicle registry it reads purchase
//! facts from.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EV SOH SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Vehicle  │  │  Inference Orchestrator │ │
//! │  │  (Axum)   │──│  Registry │──│  (spawn_blocking)       │ │
//! │  └───────────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │                       ▼                     ▼               │
//! │                ┌─────────────┐    ┌──────────────────┐     │
//! │                │   SQLite    │    │ models/ results/ │     │
//! │                └─────────────┘    └──────────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod error;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ev_soh_core::logic::model::threshold::load_threshold;
use ev_soh_core::{InferenceOrchestrator, ModelBundle, PipelineConfig};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ev_soh_server=debug,ev_soh_core=info,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("EV SOH Server v{} starting ({})...", env!("CARGO_PKG_VERSION"), config.environment);

    // Models and threshold load once, before the listener binds
    let engine = build_engine(&config)?;

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .context("Failed to run migrations")?;

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        engine: Arc::new(engine),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load estimators, threshold and pipeline constants.
///
/// A bad pipeline config is fatal. Missing estimators or metrics are not:
/// the server starts degraded and reports it on `/api/v1/model/status`.
fn build_engine(config: &config::Config) -> anyhow::Result<InferenceOrchestrator> {
    let pipeline = PipelineConfig::load_or_default(config.pipeline_config.as_deref())
        .context("Invalid pipeline config")?;

    tracing::info!("Loading estimators from {}", config.model_dir.display());
    let bundle = ModelBundle::load_from_dir(&config.model_dir);
    if !bundle.is_complete() {
        tracing::warn!("Estimator bundle incomplete, /predict will fail until models are installed");
    }

    let threshold = load_threshold(&config.metrics_path);

    Ok(InferenceOrchestrator::new(Arc::new(bundle), threshold, Arc::new(pipeline)))
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub config: config::Config,
    pub engine: Arc<InferenceOrchestrator>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/model/status", get(handlers::model::status))
        .route(
            "/api/v1/vehicles",
            post(handlers::vehicles::register).put(handlers::vehicles::update),
        )
        .route("/api/v1/vehicles/:user_id", get(handlers::vehicles::list))
        .route("/api/v1/predict", post(handlers::predict::predict));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
