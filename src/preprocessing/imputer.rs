//! Missing value imputation with fitted fill values

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strategy the fill values were computed with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Mean of the training column (numeric only)
    Mean,
    /// Median of the training column (numeric only)
    Median,
    /// Mode / most frequent value
    MostFrequent,
    /// A constant chosen at fit time
    Constant,
}

/// A single fill value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, ImputeValue>,
}

impl Imputer {
    /// Create an imputer with no fill values yet
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
        }
    }

    /// Builder method to set a numeric fill value
    pub fn with_numeric(mut self, column: impl Into<String>, value: f64) -> Self {
        self.fill_values.insert(column.into(), ImputeValue::Numeric(value));
        self
    }

    /// Builder method to set a string fill value
    pub fn with_string(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fill_values
            .insert(column.into(), ImputeValue::String(value.into()));
        self
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Fill NaN entries of a numeric column in place
    pub fn fill_numeric(&self, column: &str, values: &mut [f64]) -> Result<()> {
        let fill = match self.fill_values.get(column) {
            Some(ImputeValue::Numeric(v)) => *v,
            Some(ImputeValue::String(_)) => {
                return Err(PipelineError::InferenceError(format!(
                    "imputer holds a string fill value for numeric column '{}'",
                    column
                )))
            }
            None => return Err(self.missing_fill(column)),
        };

        for v in values.iter_mut().filter(|v| v.is_nan()) {
            *v = fill;
        }
        Ok(())
    }

    /// Fill missing labels of a categorical column in place
    pub fn fill_categorical(&self, column: &str, values: &mut [Option<String>]) -> Result<()> {
        let fill = match self.fill_values.get(column) {
            Some(ImputeValue::String(s)) => s.clone(),
            Some(ImputeValue::Numeric(v)) => v.to_string(),
            None => return Err(self.missing_fill(column)),
        };

        for v in values.iter_mut().filter(|v| v.is_none()) {
            *v = Some(fill.clone());
        }
        Ok(())
    }

    /// Check that every column has a fill value of the right kind
    pub(crate) fn validate(&self, columns: &[String], numeric: bool) -> Result<()> {
        for column in columns {
            match (self.fill_values.get(column), numeric) {
                (None, _) => return Err(self.missing_fill(column)),
                (Some(ImputeValue::Numeric(v)), true) if !v.is_finite() => {
                    return Err(PipelineError::ArtifactError(format!(
                        "imputer fill value for '{}' is not finite",
                        column
                    )))
                }
                (Some(ImputeValue::String(_)), true) => {
                    return Err(PipelineError::ArtifactError(format!(
                        "imputer holds a string fill value for numeric column '{}'",
                        column
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn missing_fill(&self, column: &str) -> PipelineError {
        PipelineError::ArtifactError(format!(
            "imputer has no fill value for column '{}'",
            column
        ))
    }
}
