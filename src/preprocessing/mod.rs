//! Fitted preprocessing stage
//!
//! Turns a record set into the numeric feature matrix the regressor expects:
//! - Missing value imputation with stored fill values
//! - Feature scaling (Standard, MinMax, Robust, MaxAbs)
//! - Categorical encoding (OneHot, Ordinal)
//! - Passthrough of numeric columns
//!
//! Every stage here is already fitted; parameters come from the pipeline
//! artifact.

mod imputer;
mod scaler;
mod encoder;
mod pipeline;

pub use imputer::{Imputer, ImputeStrategy, ImputeValue};
pub use scaler::{Scaler, ScalerType, ScalerParams};
pub use encoder::{Encoder, EncoderType, HandleUnknown};
pub use pipeline::DataPreprocessor;

use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// Check if dtype can be read as a numeric feature
fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Null
    )
}

fn lookup<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PipelineError::MissingColumns(vec![name.to_string()]))
}

/// Read a column as f64 values, nulls become NaN
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = lookup(df, name)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(PipelineError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric".to_string(),
            found: series.dtype().to_string(),
        });
    }

    let casted = series.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Read a column as optional category labels
pub(crate) fn categorical_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = lookup(df, name)?;

    if series.dtype() == &DataType::String {
        let ca = series.str()?;
        return Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect());
    }

    // A column of nulls carries no type information, read it as missing labels
    if series.null_count() == series.len() {
        return Ok(vec![None; series.len()]);
    }

    Err(PipelineError::TypeMismatch {
        column: name.to_string(),
        expected: "string".to_string(),
        found: series.dtype().to_string(),
    })
}
