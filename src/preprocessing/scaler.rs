//! Feature scaling with fitted parameters

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of scaler the parameters were fitted for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
    /// No scaling
    None,
}

/// Parameters for one scaled column: `(x - center) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64, // mean, min, or median
    pub scale: f64,  // std, range, or IQR
}

/// Feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
        }
    }

    /// Builder method to set the parameters of a column
    pub fn with_params(mut self, column: impl Into<String>, center: f64, scale: f64) -> Self {
        self.params.insert(column.into(), ScalerParams { center, scale });
        self
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    /// Scale a column in place
    pub fn scale_values(&self, column: &str, values: &mut [f64]) -> Result<()> {
        if self.scaler_type == ScalerType::None {
            return Ok(());
        }

        let params = self.params.get(column).ok_or_else(|| {
            PipelineError::ArtifactError(format!("scaler has no parameters for column '{}'", column))
        })?;

        for v in values.iter_mut() {
            *v = (*v - params.center) / params.scale;
        }
        Ok(())
    }

    pub(crate) fn validate(&self, columns: &[String]) -> Result<()> {
        if self.scaler_type == ScalerType::None {
            return Ok(());
        }

        for column in columns {
            let params = self.params.get(column).ok_or_else(|| {
                PipelineError::ArtifactError(format!("scaler has no parameters for column '{}'", column))
            })?;
            if !params.center.is_finite() || !params.scale.is_finite() || params.scale == 0.0 {
                return Err(PipelineError::ArtifactError(format!(
                    "scaler parameters for '{}' are invalid (center = {}, scale = {})",
                    column, params.center, params.scale
                )));
            }
        }
        Ok(())
    }
}
