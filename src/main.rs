//! SDN IDS
//!
//! Polls an ONOS controller for flow statistics, classifies every flow with
//! a model trained offline, and reports whether the network is under attack.
//! The same model answers single-flow predictions over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   GET /flows    ┌─────────────────────────────────────┐
//! │     ONOS     │◄────────────────│  Polling loop                       │
//! │  controller  │                 │  fetch → extract → normalize →      │
//! └──────┬───────┘                 │  classify → aggregate → publish     │
//!        │ POST /predict           └──────────────┬──────────────────────┘
//!        ▼                                        ▼
//! ┌──────────────┐   Arc<Pipeline>   ┌─────────────────────┐
//! │  HTTP (Axum) │──────────────────►│   Snapshot board    │
//! └──────────────┘                   └─────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod logic;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat, Mode};
use crate::logic::board::SnapshotBoard;
use crate::logic::decision::DecisionPolicy;
use crate::logic::features::FeatureExtractor;
use crate::logic::model::{load_artifacts, load_schema};
use crate::logic::pipeline::Pipeline;
use crate::logic::poll_loop;
use crate::logic::source::ControllerSource;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize logging
    init_tracing(config.log_format);

    tracing::info!(
        "SDN IDS {} starting (mode={}, environment={})",
        env!("CARGO_PKG_VERSION"),
        config.mode,
        config.environment
    );
    tracing::info!(
        "Controller: {} as {}",
        config.controller().flows_url(),
        config.controller_user
    );
    if config.is_production() && config.controller_password == "rocks" {
        tracing::warn!("Production environment is using the default controller password");
    }
    tracing::debug!("{:?}", config);

    match config.mode {
        Mode::Features => run_features(&config).await,
        _ => run_service(config).await,
    }
}

/// Feature dump needs the column list only
async fn run_features(config: &Config) -> anyhow::Result<()> {
    let schema = load_schema(&config.artifacts_dir)
        .with_context(|| format!("failed to load feature columns from {}", config.artifacts_dir.display()))?;
    let extractor = FeatureExtractor::new(schema);

    let source = ControllerSource::new(config.controller())?;
    poll_loop::run_feature_dump(source, &extractor, config.poll_interval).await?;
    Ok(())
}

async fn run_service(config: Config) -> anyhow::Result<()> {
    // Model artifacts; nothing runs without them
    let artifacts = load_artifacts(&config.artifacts_dir)
        .with_context(|| format!("failed to load artifacts from {}", config.artifacts_dir.display()))?;

    let policy = DecisionPolicy::for_vocabulary(
        config.benign_labels.clone(),
        config.baseline_label.clone(),
        artifacts.model.labels(),
    )?;
    tracing::info!(
        "Baseline label: {} | benign labels: {:?}",
        policy.baseline_label(),
        policy.benign_labels().collect::<Vec<_>>()
    );

    let pipeline = Arc::new(Pipeline::new(artifacts, policy));
    let board = Arc::new(SnapshotBoard::new());

    let state = AppState {
        pipeline: pipeline.clone(),
        board: board.clone(),
        config: config.clone(),
    };

    match config.mode {
        Mode::Poll => {
            let source = ControllerSource::new(config.controller())?;
            poll_loop::run(source, pipeline, board, config.poll_interval).await?;
        }
        Mode::Serve => {
            serve(create_router(state), config.port).await?;
        }
        Mode::Features => run_features(&config).await?,
        Mode::All => {
            let source = ControllerSource::new(config.controller())?;
            let poller = tokio::spawn(poll_loop::run(source, pipeline, board, config.poll_interval));

            tokio::select! {
                joined = poller => {
                    joined.context("polling task panicked")??;
                }
                result = serve(create_router(state), config.port) => {
                    result?;
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sdn_ids=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(app: Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub board: Arc<SnapshotBoard>,
    pub config: Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))

        // Latest polling cycle
        .route("/api/v1/state", get(handlers::state::current))
        .route("/api/v1/detections", get(handlers::state::detections))
        .route("/api/v1/detections/:id", get(handlers::state::detection))

        .route("/api/v1/engine", get(handlers::engine::status))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
