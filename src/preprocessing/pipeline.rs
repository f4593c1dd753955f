//! Column transformer assembling the feature matrix

use crate::error::{PipelineError, Result};
use super::{categorical_values, numeric_values, Encoder, Imputer, Scaler};
use ndarray::{Array2, ArrayView1};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

/// Fitted preprocessor.
///
/// Output columns are laid out in this order:
/// 1. numeric columns, imputed then scaled
/// 2. categorical columns, imputed then encoded
/// 3. passthrough columns, unchanged
///
/// Input columns not named here are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataPreprocessor {
    #[serde(default)]
    numeric_columns: Vec<String>,
    #[serde(default)]
    categorical_columns: Vec<String>,
    #[serde(default)]
    passthrough_columns: Vec<String>,
    #[serde(default)]
    numeric_imputer: Option<Imputer>,
    #[serde(default)]
    categorical_imputer: Option<Imputer>,
    #[serde(default)]
    scaler: Option<Scaler>,
    #[serde(default)]
    encoder: Option<Encoder>,
}

/// One transformed input column
enum Block {
    Single(Vec<f64>),
    Many(Vec<Vec<f64>>),
}

impl DataPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.numeric_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categorical_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_passthrough_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.passthrough_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_numeric_imputer(mut self, imputer: Imputer) -> Self {
        self.numeric_imputer = Some(imputer);
        self
    }

    pub fn with_categorical_imputer(mut self, imputer: Imputer) -> Self {
        self.categorical_imputer = Some(imputer);
        self
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Every column the transformer reads
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric_columns
            .iter()
            .chain(&self.categorical_columns)
            .chain(&self.passthrough_columns)
            .map(String::as_str)
    }

    /// Width of the produced feature matrix
    pub fn n_features_out(&self) -> usize {
        let encoded: usize = match &self.encoder {
            Some(encoder) => self
                .categorical_columns
                .iter()
                .map(|c| encoder.n_outputs(c))
                .sum(),
            None => 0,
        };
        self.numeric_columns.len() + encoded + self.passthrough_columns.len()
    }

    /// Names of the produced features, prefixed by their block
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .numeric_columns
            .iter()
            .map(|c| format!("num__{}", c))
            .collect();
        if let Some(encoder) = &self.encoder {
            for column in &self.categorical_columns {
                names.extend(encoder.output_names(column).into_iter().map(|n| format!("cat__{}", n)));
            }
        }
        names.extend(self.passthrough_columns.iter().map(|c| format!("remainder__{}", c)));
        names
    }

    /// Check that the fitted parameters cover every configured column
    pub fn validate(&self) -> Result<()> {
        if self.n_features_out() == 0 {
            return Err(PipelineError::ArtifactError(
                "preprocessor produces no features".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for column in self.required_columns() {
            if !seen.insert(column) {
                return Err(PipelineError::ArtifactError(format!(
                    "column '{}' is assigned to more than one block",
                    column
                )));
            }
        }

        if let Some(imputer) = &self.numeric_imputer {
            imputer.validate(&self.numeric_columns, true)?;
        }
        if let Some(imputer) = &self.categorical_imputer {
            imputer.validate(&self.categorical_columns, false)?;
        }
        if let Some(scaler) = &self.scaler {
            scaler.validate(&self.numeric_columns)?;
        }

        match &self.encoder {
            Some(encoder) => encoder.validate(&self.categorical_columns)?,
            None if !self.categorical_columns.is_empty() => {
                return Err(PipelineError::ArtifactError(
                    "categorical columns are configured without an encoder".to_string(),
                ))
            }
            None => {}
        }

        Ok(())
    }

    /// Transform a record set into the feature matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let start = Instant::now();
        self.check_columns(df)?;

        let numeric = self
            .numeric_columns
            .par_iter()
            .map(|column| self.transform_numeric(df, column).map(Block::Single));
        let categorical = self
            .categorical_columns
            .par_iter()
            .map(|column| self.transform_categorical(df, column).map(Block::Many));
        let passthrough = self
            .passthrough_columns
            .par_iter()
            .map(|column| numeric_values(df, column).map(Block::Single));

        let blocks: Vec<Block> = numeric
            .chain(categorical)
            .chain(passthrough)
            .collect::<Result<Vec<_>>>()?;

        let n_rows = df.height();
        let mut features = Array2::<f64>::zeros((n_rows, self.n_features_out()));
        let mut offset = 0;
        for block in &blocks {
            let columns: Vec<&Vec<f64>> = match block {
                Block::Single(values) => vec![values],
                Block::Many(values) => values.iter().collect(),
            };
            for values in columns {
                features
                    .column_mut(offset)
                    .assign(&ArrayView1::from(values.as_slice()));
                offset += 1;
            }
        }

        tracing::debug!(
            rows = n_rows,
            features = offset,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Preprocessor transform finished"
        );
        Ok(features)
    }

    /// Report every absent column at once
    fn check_columns(&self, df: &DataFrame) -> Result<()> {
        let missing: BTreeSet<&str> = self
            .required_columns()
            .filter(|c| df.column(c).is_err())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::MissingColumns(
                missing.into_iter().map(str::to_string).collect(),
            ))
        }
    }

    fn transform_numeric(&self, df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        let mut values = numeric_values(df, column)?;
        if let Some(imputer) = &self.numeric_imputer {
            imputer.fill_numeric(column, &mut values)?;
        }
        if let Some(scaler) = &self.scaler {
            scaler.scale_values(column, &mut values)?;
        }
        Ok(values)
    }

    fn transform_categorical(&self, df: &DataFrame, column: &str) -> Result<Vec<Vec<f64>>> {
        let mut values = categorical_values(df, column)?;
        if let Some(imputer) = &self.categorical_imputer {
            imputer.fill_categorical(column, &mut values)?;
        }
        let encoder = self.encoder.as_ref().ok_or_else(|| {
            PipelineError::ArtifactError("categorical columns are configured without an encoder".to_string())
        })?;
        encoder.encode(column, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{EncoderType, HandleUnknown, ImputeStrategy, ScalerType};

    fn preprocessor() -> DataPreprocessor {
        DataPreprocessor::new()
            .with_numeric_columns(["age"])
            .with_numeric_imputer(Imputer::new(ImputeStrategy::Mean).with_numeric("age", 40.0))
            .with_scaler(Scaler::new(ScalerType::Standard).with_params("age", 40.0, 10.0))
            .with_categorical_columns(["color"])
            .with_categorical_imputer(Imputer::new(ImputeStrategy::MostFrequent).with_string("color", "red"))
            .with_encoder(
                Encoder::new(EncoderType::OneHot)
                    .with_categories("color", ["blue", "red"])
                    .with_handle_unknown(HandleUnknown::Error),
            )
            .with_passthrough_columns(["score"])
    }

    fn frame() -> DataFrame {
        df!(
            "age" => &[Some(50.0), None, Some(30.0)],
            "color" => &[Some("blue"), None, Some("red")],
            "score" => &[1.5, 2.5, 3.5],
            "ignored" => &["x", "y", "z"],
        )
        .unwrap()
    }

    #[test]
    fn test_transform_layout() {
        let pre = preprocessor();
        pre.validate().unwrap();

        let x = pre.transform(&frame()).unwrap();
        assert_eq!(x.dim(), (3, 4));
        // age scaled, missing age imputed to the mean
        assert_eq!(x.column(0).to_vec(), vec![1.0, 0.0, -1.0]);
        // color one-hot, missing color imputed to red
        assert_eq!(x.column(1).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(x.column(2).to_vec(), vec![0.0, 1.0, 1.0]);
        // passthrough
        assert_eq!(x.column(3).to_vec(), vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_missing_columns_reported_together() {
        let df = df!("other" => &[1.0]).unwrap();
        let err = preprocessor().transform(&df).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => assert_eq!(cols, vec!["age", "color", "score"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_string_in_numeric_column() {
        let df = df!(
            "age" => &["old"],
            "color" => &["red"],
            "score" => &[1.0],
        )
        .unwrap();
        let err = preprocessor().transform(&df).unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch { ref column, .. } if column == "age"));
    }

    #[test]
    fn test_feature_names_out() {
        assert_eq!(
            preprocessor().feature_names_out(),
            vec!["num__age", "cat__color_blue", "cat__color_red", "remainder__score"]
        );
    }

    #[test]
    fn test_validate_requires_encoder() {
        let pre = DataPreprocessor::new().with_categorical_columns(["c"]);
        assert!(pre.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let pre = DataPreprocessor::new()
            .with_numeric_columns(["a"])
            .with_passthrough_columns(["a"]);
        assert!(pre.validate().is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let pre: DataPreprocessor = serde_json::from_str(r#"{"passthrough_columns": ["x"]}"#).unwrap();
        assert_eq!(pre.n_features_out(), 1);
        assert!(pre.validate().is_ok());
    }
}
