//! Pipeline artifact persistence

use super::PredictionPipeline;
use crate::error::{PipelineError, Result};
use crate::pipeline::Regressor;
use crate::preprocessing::DataPreprocessor;
use crate::regressor::RegressorModel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Artifact layout version this build reads and writes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// The two named steps of a serialized pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedSteps {
    pub preprocessor: DataPreprocessor,
    pub regressor: RegressorModel,
}

/// On-disk form of a prediction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,
    pub named_steps: NamedSteps,
}

impl PipelineArtifact {
    pub fn new(preprocessor: DataPreprocessor, regressor: impl Into<RegressorModel>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            named_steps: NamedSteps {
                preprocessor,
                regressor: regressor.into(),
            },
        }
    }

    /// Save the artifact to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read an artifact from a file, without validating it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ArtifactError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            PipelineError::ArtifactError(format!(
                "{} is not a valid pipeline artifact: {}",
                path.display(),
                e
            ))
        })
    }

    /// Check version, per-step parameters and the width both steps agree on
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::ArtifactError(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        self.named_steps.preprocessor.validate().map_err(|e| in_step(super::PREPROCESSOR_STEP, e))?;
        self.named_steps.regressor.validate().map_err(|e| in_step(super::REGRESSOR_STEP, e))?;

        let produced = self.named_steps.preprocessor.n_features_out();
        let expected = self.named_steps.regressor.n_features();
        if produced != expected {
            return Err(PipelineError::ArtifactError(format!(
                "step '{}' produces {} features but step '{}' expects {}",
                super::PREPROCESSOR_STEP,
                produced,
                super::REGRESSOR_STEP,
                expected
            )));
        }
        Ok(())
    }

    /// Validate and turn into a runnable pipeline
    pub fn into_pipeline(self) -> Result<PredictionPipeline> {
        self.validate()?;
        let NamedSteps { preprocessor, regressor } = self.named_steps;
        PredictionPipeline::new(Box::new(preprocessor), Box::new(regressor))
    }
}

fn in_step(step: &str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::ArtifactError(msg) => {
            PipelineError::ArtifactError(format!("step '{}': {}", step, msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{Scaler, ScalerType};
    use crate::regressor::{DecisionTree, GradientBoostingRegressor, LinearRegressor, TreeNode};
    use polars::prelude::*;
    use tempfile::NamedTempFile;

    fn artifact() -> PipelineArtifact {
        PipelineArtifact::new(
            DataPreprocessor::new()
                .with_numeric_columns(["a"])
                .with_scaler(Scaler::new(ScalerType::Standard).with_params("a", 1.0, 2.0)),
            LinearRegressor::new(vec![3.0], 1.0),
        )
    }

    #[test]
    fn test_save_then_load_predicts_the_same() {
        let file = NamedTempFile::new().unwrap();
        artifact().save(file.path()).unwrap();

        let pipeline = PredictionPipeline::load(file.path()).unwrap();
        let df = df!("a" => &[5.0]).unwrap();
        // (5 - 1) / 2 * 3 + 1
        assert_eq!(pipeline.predict(&df).unwrap(), vec![7.0]);
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineArtifact::load("/nonexistent/pipeline.json").unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactError(_)));
    }

    #[test]
    fn test_corrupt_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        let err = PipelineArtifact::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("not a valid pipeline artifact"));
    }

    #[test]
    fn test_missing_regressor_step() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"format_version": 1, "named_steps": {"preprocessor": {"passthrough_columns": ["a"]}}}"#,
        )
        .unwrap();
        let err = PipelineArtifact::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("regressor"));
    }

    #[test]
    fn test_version_checked() {
        let mut artifact = artifact();
        artifact.format_version = 99;
        let err = artifact.into_pipeline().unwrap_err();
        assert!(err.to_string().contains("format version 99"));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let artifact = PipelineArtifact::new(
            DataPreprocessor::new().with_passthrough_columns(["a", "b"]),
            LinearRegressor::new(vec![1.0], 0.0),
        );
        let err = artifact.validate().unwrap_err();
        assert!(err.to_string().contains("produces 2 features"));
    }

    #[test]
    fn test_step_named_in_validation_error() {
        let artifact = PipelineArtifact::new(
            DataPreprocessor::new()
                .with_numeric_columns(["a"])
                .with_scaler(Scaler::new(ScalerType::Standard)),
            LinearRegressor::new(vec![1.0], 0.0),
        );
        let err = artifact.validate().unwrap_err();
        assert!(err.to_string().contains("step 'preprocessor'"));
    }

    #[test]
    fn test_deep_tree_round_trips() {
        // node k: x <= k goes to a leaf worth k, otherwise one level deeper
        let depth = 300;
        let mut root = TreeNode::leaf(depth as f64);
        for k in (0..depth).rev() {
            root = TreeNode::split(0, k as f64, TreeNode::leaf(k as f64), root);
        }
        let regressor = GradientBoostingRegressor::new(1, 1.0, 0.0).with_tree(DecisionTree::new(root));
        assert_eq!(regressor.max_depth(), depth + 1);

        let file = NamedTempFile::new().unwrap();
        PipelineArtifact::new(DataPreprocessor::new().with_passthrough_columns(["a"]), regressor)
            .save(file.path())
            .unwrap();

        let pipeline = PredictionPipeline::load(file.path()).unwrap();
        let df = df!("a" => &[150.0, 1e6]).unwrap();
        assert_eq!(pipeline.predict(&df).unwrap(), vec![150.0, depth as f64]);
    }
}
