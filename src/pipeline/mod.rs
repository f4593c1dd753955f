//! Two-stage prediction pipeline
//!
//! A pipeline is a `preprocessor` (record set to feature matrix) followed by a
//! `regressor` (feature matrix to predictions). Both stages are trait objects,
//! loaded once from an artifact and only read afterwards.

mod artifact;

pub use artifact::{NamedSteps, PipelineArtifact, ARTIFACT_FORMAT_VERSION};

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView2};
use polars::prelude::DataFrame;
use std::path::Path;

/// Step names, as they appear in artifacts and error messages
pub const PREPROCESSOR_STEP: &str = "preprocessor";
pub const REGRESSOR_STEP: &str = "regressor";

/// Record set to numeric feature matrix
pub trait Preprocessor: Send + Sync {
    fn transform(&self, frame: &DataFrame) -> Result<Array2<f64>>;

    /// Width of the matrix `transform` produces
    fn n_features_out(&self) -> usize;
}

/// Numeric feature matrix to one prediction per row
pub trait Regressor: Send + Sync {
    /// Short model name used in logs
    fn kind(&self) -> &'static str;

    fn n_features(&self) -> usize;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>>;
}

impl Preprocessor for crate::preprocessing::DataPreprocessor {
    fn transform(&self, frame: &DataFrame) -> Result<Array2<f64>> {
        crate::preprocessing::DataPreprocessor::transform(self, frame)
    }

    fn n_features_out(&self) -> usize {
        crate::preprocessing::DataPreprocessor::n_features_out(self)
    }
}

/// Loaded, read-only prediction pipeline
pub struct PredictionPipeline {
    preprocessor: Box<dyn Preprocessor>,
    regressor: Box<dyn Regressor>,
}

impl std::fmt::Debug for PredictionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionPipeline")
            .field("n_features", &self.regressor.n_features())
            .field("regressor", &self.regressor.kind())
            .finish()
    }
}

impl PredictionPipeline {
    /// Build a pipeline from two stages, checking they agree on the feature width
    pub fn new(preprocessor: Box<dyn Preprocessor>, regressor: Box<dyn Regressor>) -> Result<Self> {
        let produced = preprocessor.n_features_out();
        let expected = regressor.n_features();
        if produced != expected {
            return Err(PipelineError::ArtifactError(format!(
                "step '{}' produces {} features but step '{}' expects {}",
                PREPROCESSOR_STEP, produced, REGRESSOR_STEP, expected
            )));
        }
        Ok(Self { preprocessor, regressor })
    }

    /// Load and validate a pipeline artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        PipelineArtifact::load(path)?.into_pipeline()
    }

    pub fn regressor_kind(&self) -> &'static str {
        self.regressor.kind()
    }

    pub fn n_features(&self) -> usize {
        self.regressor.n_features()
    }

    /// Run both stages; an empty record set yields no predictions
    pub fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>> {
        let n_rows = frame.height();
        if n_rows == 0 {
            return Ok(Vec::new());
        }

        let features = self.preprocessor.transform(frame)?;
        if features.nrows() != n_rows {
            return Err(PipelineError::ShapeError {
                expected: format!("{} rows from step '{}'", n_rows, PREPROCESSOR_STEP),
                actual: format!("{} rows", features.nrows()),
            });
        }

        let predictions = self.regressor.predict(features.view())?;
        if predictions.len() != n_rows {
            return Err(PipelineError::ShapeError {
                expected: format!("{} predictions from step '{}'", n_rows, REGRESSOR_STEP),
                actual: format!("{} predictions", predictions.len()),
            });
        }

        Ok(predictions.to_vec())
    }
}
