//! Linear regression inference

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::check_features;
use crate::error::{PipelineError, Result};
use crate::pipeline::Regressor;

/// Fitted linear model: `intercept + x . coefficients`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(PipelineError::ArtifactError(
                "linear regressor has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::ArtifactError(
                "linear regressor holds non-finite parameters".to_string(),
            ));
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_features(&x, self.coefficients.len())?;
        let coefficients = ArrayView1::from(self.coefficients.as_slice());
        Ok(x.dot(&coefficients) + self.intercept)
    }
}
