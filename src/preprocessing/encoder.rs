//! Categorical encoding with fitted category lists

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Type of encoder to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderType {
    /// One-hot encoding, one output column per category
    OneHot,
    /// Ordinal encoding, category index in a single column
    Ordinal,
}

/// What to do with a label that was not seen at fit time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// One-hot: all-zero block. Ordinal: `unknown_value`.
    Ignore,
}

fn default_unknown_value() -> f64 {
    -1.0
}

/// Categorical encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    #[serde(default)]
    handle_unknown: HandleUnknown,
    #[serde(default = "default_unknown_value")]
    unknown_value: f64,
    // column name -> categories in output order
    categories: HashMap<String, Vec<String>>,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            handle_unknown: HandleUnknown::Error,
            unknown_value: default_unknown_value(),
            categories: HashMap::new(),
        }
    }

    /// Builder method to set the categories of a column
    pub fn with_categories<S: Into<String>>(
        mut self,
        column: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categories.insert(
            column.into(),
            categories.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Builder method to set unknown-label handling
    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    pub fn encoder_type(&self) -> &EncoderType {
        &self.encoder_type
    }

    /// Output names for a column, e.g. `color_red`
    pub fn output_names(&self, column: &str) -> Vec<String> {
        match self.encoder_type {
            EncoderType::OneHot => self
                .categories
                .get(column)
                .map(|cats| cats.iter().map(|c| format!("{}_{}", column, c)).collect())
                .unwrap_or_default(),
            EncoderType::Ordinal => vec![column.to_string()],
        }
    }

    /// Number of output columns a column expands into
    pub fn n_outputs(&self, column: &str) -> usize {
        match self.encoder_type {
            EncoderType::OneHot => self.categories.get(column).map_or(0, Vec::len),
            EncoderType::Ordinal => 1,
        }
    }

    /// Encode a column, returning its output columns
    pub fn encode(&self, column: &str, values: &[Option<String>]) -> Result<Vec<Vec<f64>>> {
        let categories = self.categories.get(column).ok_or_else(|| {
            PipelineError::ArtifactError(format!("encoder has no categories for column '{}'", column))
        })?;
        let index: HashMap<&str, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut outputs = vec![vec![0.0; values.len()]; self.n_outputs(column)];

        for (row, value) in values.iter().enumerate() {
            let position = value.as_deref().and_then(|v| index.get(v).copied());
            match (position, self.handle_unknown) {
                (Some(i), _) => match self.encoder_type {
                    EncoderType::OneHot => outputs[i][row] = 1.0,
                    EncoderType::Ordinal => outputs[0][row] = i as f64,
                },
                (None, HandleUnknown::Ignore) => {
                    if self.encoder_type == EncoderType::Ordinal {
                        outputs[0][row] = self.unknown_value;
                    }
                }
                (None, HandleUnknown::Error) => {
                    return Err(PipelineError::UnknownCategory {
                        column: column.to_string(),
                        value: value.clone().unwrap_or_else(|| "None".to_string()),
                    })
                }
            }
        }

        Ok(outputs)
    }

    pub(crate) fn validate(&self, columns: &[String]) -> Result<()> {
        for column in columns {
            let categories = self.categories.get(column).ok_or_else(|| {
                PipelineError::ArtifactError(format!("encoder has no categories for column '{}'", column))
            })?;
            if categories.is_empty() {
                return Err(PipelineError::ArtifactError(format!(
                    "encoder category list for '{}' is empty",
                    column
                )));
            }
            let mut seen = HashSet::new();
            if let Some(duplicate) = categories.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(PipelineError::ArtifactError(format!(
                    "encoder category list for '{}' repeats '{}'",
                    column, duplicate
                )));
            }
        }
        Ok(())
    }
}
