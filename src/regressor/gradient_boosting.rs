//! Gradient Boosting regressor inference
//!
//! Prediction is `init_prediction + learning_rate * sum(tree(x))` over the
//! boosted trees.

use ndarray::{Array1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use super::check_features;
use crate::error::{PipelineError, Result};
use crate::pipeline::Regressor;

/// Batches at least this large are evaluated in parallel
const PARALLEL_ROW_THRESHOLD: usize = 1024;

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    n_features: usize,
    learning_rate: f64,
    init_prediction: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoostingRegressor {
    pub fn new(n_features: usize, learning_rate: f64, init_prediction: f64) -> Self {
        Self {
            n_features,
            learning_rate,
            init_prediction,
            trees: Vec::new(),
        }
    }

    /// Builder method to append a boosted tree
    pub fn with_tree(mut self, tree: DecisionTree) -> Self {
        self.trees.push(tree);
        self
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.n_features == 0 {
            return Err(PipelineError::ArtifactError(
                "gradient boosting regressor declares zero features".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || !self.init_prediction.is_finite() {
            return Err(PipelineError::ArtifactError(
                "gradient boosting learning_rate and init_prediction must be finite".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| match e {
                PipelineError::ArtifactError(msg) => PipelineError::ArtifactError(format!("tree {}: {}", i, msg)),
                other => other,
            })?;
            if let Some(feature) = tree.max_feature_index() {
                if feature >= self.n_features {
                    return Err(PipelineError::ArtifactError(format!(
                        "tree {} splits on feature {} but the regressor has {} features",
                        i, feature, self.n_features
                    )));
                }
            }
            if !tree.is_finite() {
                return Err(PipelineError::ArtifactError(format!(
                    "tree {} holds a non-finite threshold or leaf value",
                    i
                )));
            }
        }
        Ok(())
    }

    fn predict_row(&self, x: &ArrayView2<'_, f64>, i: usize) -> f64 {
        let sample = x.row(i);
        let boosted: f64 = self.trees.iter().map(|t| t.predict_sample(sample)).sum();
        self.init_prediction + self.learning_rate * boosted
    }
}

impl Regressor for GradientBoostingRegressor {
    fn kind(&self) -> &'static str {
        "gradient_boosting"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_features(&x, self.n_features)?;

        let n = x.nrows();
        let predictions: Vec<f64> = if n >= PARALLEL_ROW_THRESHOLD {
            (0..n)
                .into_par_iter()
                .map(|i| self.predict_row(&x, i))
                .collect()
        } else {
            (0..n).map(|i| self.predict_row(&x, i)).collect()
        };

        Ok(Array1::from_vec(predictions))
    }
}
