//! Fitted regressor stage
//!
//! Supported models:
//! - Gradient boosted regression trees
//! - Linear regression

mod tree;
mod gradient_boosting;
mod linear;

pub use tree::{DecisionTree, TreeNode, TREE_LEAF};
pub use gradient_boosting::GradientBoostingRegressor;
pub use linear::LinearRegressor;

use crate::error::{PipelineError, Result};
use crate::pipeline::Regressor;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Regressor as stored in a pipeline artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegressorModel {
    GradientBoosting(GradientBoostingRegressor),
    Linear(LinearRegressor),
}

impl RegressorModel {
    pub fn validate(&self) -> Result<()> {
        match self {
            RegressorModel::GradientBoosting(m) => m.validate(),
            RegressorModel::Linear(m) => m.validate(),
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            RegressorModel::GradientBoosting(m) => m,
            RegressorModel::Linear(m) => m,
        }
    }
}

impl Regressor for RegressorModel {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }
}

impl From<GradientBoostingRegressor> for RegressorModel {
    fn from(model: GradientBoostingRegressor) -> Self {
        RegressorModel::GradientBoosting(model)
    }
}

impl From<LinearRegressor> for RegressorModel {
    fn from(model: LinearRegressor) -> Self {
        RegressorModel::Linear(model)
    }
}

/// Check the feature matrix width and reject non-finite values
pub(crate) fn check_features(x: &ArrayView2<'_, f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(PipelineError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }

    if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(PipelineError::InvalidInput(format!(
            "feature matrix contains NaN or infinity at row {}, feature {}",
            row, col
        )));
    }

    Ok(())
}
