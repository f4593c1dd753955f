//! Request body to record set conversion
//!
//! Accepts the shapes a tabular JSON payload usually comes in:
//! - a list of row objects: `[{"a": 1, "b": "x"}, ...]`
//! - a mapping of column to values: `{"a": [1, 2], "b": ["x", "y"]}`
//! - a mapping of column to row-label mapping: `{"a": {"0": 1, "1": 2}}`
//! - a mapping of scalars, read as a single record: `{"a": 1, "b": "x"}`
//!
//! Column dtypes are inferred from the JSON values. No schema checks happen
//! here; those belong to the preprocessor.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Parse a raw request body into a record set
pub fn parse_body(body: &[u8]) -> Result<DataFrame> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PipelineError::InvalidPayload(format!("body is not valid JSON: {}", e)))?;
    from_json(&value)
}

/// Convert an already parsed JSON value into a record set
pub fn from_json(value: &Value) -> Result<DataFrame> {
    let table = match value {
        Value::Array(rows) => RawTable::from_rows(rows)?,
        Value::Object(map) => RawTable::from_mapping(map)?,
        other => {
            return Err(PipelineError::InvalidPayload(format!(
                "expected a list of records or a mapping of columns, got {}",
                json_kind(other)
            )))
        }
    };
    table.into_frame()
}

/// Column-major cells collected from the payload, before dtype inference
struct RawTable {
    height: usize,
    columns: Vec<(String, Vec<Value>)>,
}

impl RawTable {
    fn from_rows(rows: &[Value]) -> Result<Self> {
        let mut columns: Vec<(String, Vec<Value>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (row_idx, row) in rows.iter().enumerate() {
            let record = row.as_object().ok_or_else(|| {
                PipelineError::InvalidPayload(format!(
                    "record {} is {}, expected an object",
                    row_idx,
                    json_kind(row)
                ))
            })?;

            for (key, cell) in record {
                let col_idx = match index.get(key) {
                    Some(&i) => i,
                    None => {
                        columns.push((key.clone(), vec![Value::Null; row_idx]));
                        index.insert(key.clone(), columns.len() - 1);
                        columns.len() - 1
                    }
                };
                columns[col_idx].1.push(cell.clone());
            }

            // Keys absent from this record become nulls
            for (_, values) in columns.iter_mut() {
                if values.len() < row_idx + 1 {
                    values.push(Value::Null);
                }
            }
        }

        Ok(Self {
            height: rows.len(),
            columns,
        })
    }

    fn from_mapping(map: &Map<String, Value>) -> Result<Self> {
        if map.is_empty() {
            return Ok(Self { height: 0, columns: Vec::new() });
        }

        let has_lists = map.values().any(Value::is_array);
        let all_mappings = map.values().all(Value::is_object);

        if has_lists {
            Self::from_column_lists(map)
        } else if all_mappings {
            Self::from_labelled_columns(map)
        } else if map.values().any(Value::is_object) {
            Err(PipelineError::InvalidPayload(
                "cannot mix row-label mappings with scalar values".to_string(),
            ))
        } else {
            Ok(Self {
                height: 1,
                columns: map.iter().map(|(k, v)| (k.clone(), vec![v.clone()])).collect(),
            })
        }
    }

    fn from_column_lists(map: &Map<String, Value>) -> Result<Self> {
        let mut height: Option<usize> = None;
        for (name, value) in map {
            if let Value::Array(values) = value {
                match height {
                    None => height = Some(values.len()),
                    Some(h) if h != values.len() => {
                        return Err(PipelineError::InvalidPayload(format!(
                            "all arrays must be of the same length (column '{}' has {}, expected {})",
                            name,
                            values.len(),
                            h
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        let height = height.unwrap_or(0);

        let columns = map
            .iter()
            .map(|(name, value)| match value {
                Value::Array(values) => Ok((name.clone(), values.clone())),
                Value::Object(_) => Err(PipelineError::InvalidPayload(format!(
                    "column '{}' is a mapping while other columns are lists",
                    name
                ))),
                scalar => Ok((name.clone(), vec![scalar.clone(); height])),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { height, columns })
    }

    fn from_labelled_columns(map: &Map<String, Value>) -> Result<Self> {
        let mut labels: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for value in map.values() {
            if let Value::Object(cells) = value {
                for label in cells.keys() {
                    if seen.insert(label.as_str()) {
                        labels.push(label.as_str());
                    }
                }
            }
        }

        let columns = map
            .iter()
            .map(|(name, value)| {
                let cells = value.as_object();
                let values = labels
                    .iter()
                    .map(|label| {
                        cells
                            .and_then(|c| c.get(*label))
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                (name.clone(), values)
            })
            .collect();

        Ok(Self {
            height: labels.len(),
            columns,
        })
    }

    fn into_frame(self) -> Result<DataFrame> {
        // `[{}, {}]` is two records with no fields, not an empty set
        if self.columns.is_empty() {
            return Ok(DataFrame::full_null(&Schema::default(), self.height));
        }

        let columns: Vec<Column> = self
            .columns
            .into_iter()
            .map(|(name, values)| build_series(&name, &values).map(Column::from))
            .collect::<Result<Vec<_>>>()?;

        let df = DataFrame::new(columns)?;
        debug_assert_eq!(df.height(), self.height);
        Ok(df)
    }
}

/// Kind of value seen in a column
#[derive(Debug, Default)]
struct CellKinds {
    numbers: bool,
    bools: bool,
    strings: bool,
}

impl CellKinds {
    fn of(name: &str, values: &[Value]) -> Result<Self> {
        let mut kinds = Self::default();
        for (row_idx, value) in values.iter().enumerate() {
            match value {
                Value::Null => {}
                Value::Number(_) => kinds.numbers = true,
                Value::Bool(_) => kinds.bools = true,
                Value::String(_) => kinds.strings = true,
                nested => {
                    return Err(PipelineError::InvalidPayload(format!(
                        "column '{}' row {} holds {}, expected a scalar",
                        name,
                        row_idx,
                        json_kind(nested)
                    )))
                }
            }
        }
        Ok(kinds)
    }

    /// e.g. "a mix of strings and booleans"
    fn describe(&self) -> String {
        let seen: Vec<&str> = [
            (self.strings, "strings"),
            (self.numbers, "numbers"),
            (self.bools, "booleans"),
        ]
        .into_iter()
        .filter_map(|(present, kind)| present.then_some(kind))
        .collect();

        match seen.as_slice() {
            [] => "only nulls".to_string(),
            [one] => format!("only {}", one),
            [init @ .., last] => format!("a mix of {} and {}", init.join(", "), last),
        }
    }
}

fn build_series(name: &str, values: &[Value]) -> Result<Series> {
    let kinds = CellKinds::of(name, values)?;

    if kinds.strings {
        if kinds.numbers || kinds.bools {
            return Err(PipelineError::TypeMismatch {
                column: name.to_string(),
                expected: "values of a single type".to_string(),
                found: kinds.describe(),
            });
        }
        let cells: Vec<Option<&str>> = values.iter().map(Value::as_str).collect();
        return Ok(Series::new(name.into(), cells));
    }

    if kinds.bools && !kinds.numbers {
        let cells: Vec<Option<bool>> = values.iter().map(Value::as_bool).collect();
        return Ok(Series::new(name.into(), cells));
    }

    // Numbers, numbers mixed with booleans, and all-null columns
    let cells: Vec<Option<f64>> = values
        .iter()
        .map(|v| match v {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_f64(),
        })
        .collect();
    Ok(Series::new(name.into(), cells))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_list_of_records() {
        let df = from_json(&json!([
            {"feature1": 1.0, "feature2": "A"},
            {"feature1": 2.5, "feature2": "B"},
        ]))
        .unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(column_names(&df), vec!["feature1", "feature2"]);
        let f1 = df.column("feature1").unwrap().as_materialized_series();
        assert_eq!(f1.dtype(), &DataType::Float64);
        assert_eq!(f1.f64().unwrap().get(1), Some(2.5));
        let f2 = df.column("feature2").unwrap().as_materialized_series();
        assert_eq!(f2.str().unwrap().get(0), Some("A"));
    }

    #[test]
    fn test_absent_keys_become_nulls() {
        let df = from_json(&json!([
            {"a": 1},
            {"b": "x"},
            {"a": 3, "b": "y"},
        ]))
        .unwrap();

        assert_eq!(df.height(), 3);
        let a = df.column("a").unwrap().as_materialized_series();
        let b = df.column("b").unwrap().as_materialized_series();
        assert_eq!(a.null_count(), 1);
        assert_eq!(b.null_count(), 1);
        assert_eq!(b.str().unwrap().get(0), None);
        assert_eq!(b.str().unwrap().get(1), Some("x"));
    }

    #[test]
    fn test_column_mapping_with_broadcast_scalar() {
        let df = from_json(&json!({"a": [1, 2, 3], "b": "same"})).unwrap();
        assert_eq!(df.height(), 3);
        let b = df.column("b").unwrap().as_materialized_series();
        assert_eq!(b.str().unwrap().get(2), Some("same"));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = from_json(&json!({"a": [1, 2], "b": [1]})).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPayload(_)));
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn test_labelled_columns() {
        let df = from_json(&json!({
            "a": {"0": 1.0, "1": 2.0},
            "b": {"1": "y", "0": "x"},
        }))
        .unwrap();

        assert_eq!(df.height(), 2);
        let b = df.column("b").unwrap().as_materialized_series();
        assert_eq!(b.str().unwrap().get(0), Some("x"));
        assert_eq!(b.str().unwrap().get(1), Some("y"));
    }

    #[test]
    fn test_scalar_mapping_is_single_record() {
        let df = from_json(&json!({"bad": "shape"})).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(column_names(&df), vec!["bad"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(from_json(&json!([])).unwrap().height(), 0);
        assert_eq!(from_json(&json!({})).unwrap().height(), 0);
        let df = from_json(&json!({"a": []})).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 1);
    }

    #[test]
    fn test_invalid_shapes() {
        for body in [json!(5), json!("text"), json!(null), json!([1, 2])] {
            let err = from_json(&body).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidPayload(_)), "{}", body);
        }
    }

    #[test]
    fn test_nested_cell_rejected() {
        let err = from_json(&json!([{"a": [1, 2]}])).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPayload(_)));
    }

    #[test]
    fn test_mixed_types_rejected() {
        let err = from_json(&json!([{"a": 1}, {"a": "x"}])).unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_mismatch_names_the_kinds_seen() {
        let err = from_json(&json!([{"a": true}, {"a": "x"}])).unwrap_err();
        assert!(err.to_string().contains("strings and booleans"), "{}", err);

        let err = from_json(&json!([{"a": true}, {"a": "x"}, {"a": 2}])).unwrap_err();
        assert!(err.to_string().contains("strings, numbers and booleans"), "{}", err);

        let err = from_json(&json!({"a": [1, "x"]})).unwrap_err();
        assert!(err.to_string().contains("strings and numbers"), "{}", err);
    }

    #[test]
    fn test_records_without_fields_keep_their_count() {
        let df = from_json(&json!([{}, {}])).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 0);

        assert_eq!(from_json(&json!([{}])).unwrap().height(), 1);
    }

    #[test]
    fn test_bool_and_null_columns() {
        let df = from_json(&json!([{"flag": true, "none": null}, {"flag": false, "none": null}])).unwrap();
        let flag = df.column("flag").unwrap().as_materialized_series();
        assert_eq!(flag.dtype(), &DataType::Boolean);
        let none = df.column("none").unwrap().as_materialized_series();
        assert_eq!(none.dtype(), &DataType::Float64);
        assert_eq!(none.null_count(), 2);
    }

    #[test]
    fn test_parse_body_rejects_non_json() {
        let err = parse_body(b"not valid json").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPayload(_)));
    }
}
