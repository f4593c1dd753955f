//! gbr-serve - HTTP prediction service for a pre-trained regression pipeline
//!
//! A pipeline artifact holds two named steps: a column preprocessor
//! (imputation, scaling, one-hot/ordinal encoding) and a regressor
//! (gradient boosted trees or a linear model). The server loads it once and
//! scores JSON tables posted to `/predict`.
//!
//! # Modules
//!
//! - [`error`] - Error type and its client-facing categories
//! - [`records`] - JSON request bodies to DataFrames
//! - [`preprocessing`] - Column transformer producing the feature matrix
//! - [`regressor`] - Gradient boosting and linear regressors
//! - [`pipeline`] - Two-step pipeline and its on-disk artifact
//! - [`server`] - HTTP server with the prediction API
//! - [`cli`] - Command-line interface

pub mod error;
pub mod records;
pub mod preprocessing;
pub mod regressor;
pub mod pipeline;

// Services
pub mod server;
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ErrorCategory, PipelineError, Result};

    pub use crate::preprocessing::{
        DataPreprocessor, Encoder, EncoderType, HandleUnknown, ImputeStrategy, Imputer, Scaler, ScalerType,
    };

    pub use crate::regressor::{DecisionTree, GradientBoostingRegressor, LinearRegressor, RegressorModel, TreeNode};

    pub use crate::pipeline::{PipelineArtifact, PredictionPipeline, Preprocessor, Regressor};

    pub use crate::server::{create_router, AppState, ErrorStatusPolicy, ServerConfig};
}
