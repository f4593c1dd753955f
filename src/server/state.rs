//! Application state management

use std::sync::Arc;

use crate::pipeline::PredictionPipeline;
use super::ServerConfig;

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    /// Loaded once at startup, never replaced
    pub pipeline: Arc<PredictionPipeline>,
}

impl AppState {
    pub fn new(config: ServerConfig, pipeline: PredictionPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }
}
