//! Prediction server
//!
//! Loads a serialized pipeline once at startup and serves it over HTTP:
//! `GET /` answers a liveness probe, `POST /predict` scores a JSON table.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{PredictResponse, LIVENESS_MESSAGE};
pub use state::AppState;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::ValueEnum;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::pipeline::PredictionPipeline;

/// How failures map onto HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ErrorStatusPolicy {
    /// 400 for malformed bodies, 422 for schema problems, 500 otherwise
    #[default]
    Categorized,
    /// Every failure is a 200 with an `error` body
    AlwaysOk,
}

impl std::str::FromStr for ErrorStatusPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        <Self as ValueEnum>::from_str(s, true).map_err(|_| {
            PipelineError::ConfigError(format!(
                "unknown error status policy '{}' (expected 'categorized' or 'always-ok')",
                s
            ))
        })
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub error_status: ErrorStatusPolicy,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            model_path: PathBuf::from("gbr_pipeline.json"),
            error_status: ErrorStatusPolicy::Categorized,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `API_HOST`, `API_PORT`, `MODEL_PATH`,
    /// `ERROR_STATUS` and `MAX_BODY_SIZE`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("API_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            config.port = port
                .parse()
                .map_err(|_| PipelineError::ConfigError(format!("API_PORT is not a valid port: {}", port)))?;
        }
        if let Some(path) = lookup("MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(policy) = lookup("ERROR_STATUS") {
            config.error_status = policy.parse()?;
        }
        if let Some(size) = lookup("MAX_BODY_SIZE") {
            config.max_body_bytes = size.parse().map_err(|_| {
                PipelineError::ConfigError(format!("MAX_BODY_SIZE is not a byte count: {}", size))
            })?;
        }
        Ok(config)
    }

    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        model_path = %config.model_path.display(),
        started_at = %start_time.to_rfc3339(),
        "Loading prediction pipeline"
    );

    let pipeline = PredictionPipeline::load(&config.model_path)
        .with_context(|| format!("failed to load pipeline from {}", config.model_path.display()))?;
    info!(
        regressor = pipeline.regressor_kind(),
        n_features = pipeline.n_features(),
        "Pipeline ready"
    );

    if config.error_status == ErrorStatusPolicy::AlwaysOk {
        warn!("Error status policy is always-ok, failed predictions will answer 200");
    }

    let addr = config.address()?;
    let state = Arc::new(AppState::new(config.clone(), pipeline));
    let app = create_router(state);

    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        max_body_kb = config.max_body_bytes / 1024,
        "Prediction server starting"
    );
    info!(url = %format!("http://{}/predict", addr), "Prediction endpoint available");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
