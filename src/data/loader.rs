use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::{DataPoint, Dataset, MetadataValue};
use crate::error::Error;

/// Accepted names for the timestamp column, in priority order.
const TIMESTAMP_COLUMNS: [&str; 2] = ["timestamp", "date"];
/// Accepted names for the value column, in priority order.
const VALUE_COLUMNS: [&str; 2] = ["value", "measurement"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a time-series dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; `timestamp`/`date` and `value`/`measurement` columns
/// * `.json`    – `[{ "timestamp": "...", "value": 1.0, ...meta }, ...]` or one object
/// * `.parquet` – same column names, any numeric type for the value
///
/// Rows whose value is missing, non-numeric or non-finite are dropped, so the
/// resulting [`Dataset::values`] is always a clean series.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            read_csv(file)?
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json_str(&text)?
        }
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(Error::UnsupportedFormat(other.to_string()).into()),
    };

    log::info!(
        "Loaded {} points ({} metadata columns) from {}",
        dataset.len(),
        dataset.column_names.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse CSV text already held in memory.
pub fn parse_csv_str(text: &str) -> Result<Dataset> {
    read_csv(text.as_bytes())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv<R: Read>(source: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let value_idx = find_column(&headers, &VALUE_COLUMNS)
        .ok_or_else(|| Error::MissingColumn(VALUE_COLUMNS[0].to_string()))?;
    let ts_idx = find_column(&headers, &TIMESTAMP_COLUMNS);

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let raw = record.get(value_idx).unwrap_or("");
        let Some(value) = parse_value(raw) else {
            log::debug!("CSV row {row_no}: dropping non-numeric value '{raw}'");
            skipped += 1;
            continue;
        };

        let timestamp = ts_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut metadata = BTreeMap::new();
        for (col_idx, cell) in record.iter().enumerate() {
            if col_idx == value_idx || Some(col_idx) == ts_idx {
                continue;
            }
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            metadata.insert(col_name.clone(), MetadataValue::guess(cell));
        }

        points.push(DataPoint {
            timestamp,
            value,
            metadata,
        });
    }

    report_skipped("CSV", skipped);
    Ok(Dataset::from_points(points))
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| headers.iter().position(|h| h.eq_ignore_ascii_case(c)))
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn report_skipped(source: &str, skipped: usize) {
    if skipped > 0 {
        log::warn!("{source}: skipped {skipped} rows with missing or non-numeric values");
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Parse JSON text already held in memory.
///
/// Expected schema (records-oriented):
///
/// ```json
/// [
///   { "timestamp": "2024-01-01T00:00:00", "value": 20.5, "sensor": "A" },
///   ...
/// ]
/// ```
///
/// A single top-level object is treated as a one-row dataset.
pub fn parse_json_str(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text)
        .map_err(Error::from)
        .context("parsing JSON")?;

    let records = match root {
        JsonValue::Array(items) => items,
        obj @ JsonValue::Object(_) => vec![obj],
        other => {
            return Err(Error::InvalidLayout(format!(
                "expected an array of objects, got {}",
                json_kind(&other)
            ))
            .into());
        }
    };

    let mut points = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| Error::InvalidLayout(format!("row {i} is not a JSON object")))?;

        let Some((value_key, value)) = find_field(obj, &VALUE_COLUMNS, json_to_f64) else {
            log::debug!("JSON row {i}: missing or non-numeric value");
            skipped += 1;
            continue;
        };

        let (ts_key, timestamp) = find_field(obj, &TIMESTAMP_COLUMNS, json_to_timestamp)
            .map_or((None, None), |(k, ts)| (Some(k), Some(ts)));

        points.push(DataPoint {
            timestamp,
            value,
            metadata: json_metadata(obj, Some(value_key), ts_key),
        });
    }

    report_skipped("JSON", skipped);
    Ok(Dataset::from_points(points))
}

/// First usable field among `candidates`, in priority order. Keys match
/// ignoring ASCII case, like CSV headers; a present but unusable field (such
/// as `null`) falls through to the next candidate.
fn find_field<'a, T>(
    obj: &'a Map<String, JsonValue>,
    candidates: &[&str],
    convert: fn(&JsonValue) -> Option<T>,
) -> Option<(&'a str, T)> {
    candidates.iter().find_map(|name| {
        obj.iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .find_map(|(key, val)| convert(val).map(|t| (key.as_str(), t)))
    })
}

fn json_to_f64(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        JsonValue::String(s) => parse_value(s),
        _ => None,
    }
}

fn json_to_timestamp(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_metadata(
    obj: &Map<String, JsonValue>,
    value_key: Option<&str>,
    ts_key: Option<&str>,
) -> BTreeMap<String, MetadataValue> {
    obj.iter()
        .filter(|(key, _)| Some(key.as_str()) != value_key && Some(key.as_str()) != ts_key)
        .map(|(key, val)| (key.clone(), json_to_metadata(val)))
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

fn json_kind(val: &JsonValue) -> &'static str {
    match val {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one observation per row.
///
/// Expected schema:
/// - `value` (or `measurement`): any numeric type, cast to Float64
/// - `timestamp` (or `date`): any type, rendered as text
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(Error::from)
        .context("reading parquet metadata")?;
    let reader = builder
        .build()
        .map_err(Error::from)
        .context("building parquet reader")?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for batch_result in reader {
        let batch = batch_result
            .map_err(Error::from)
            .context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

        let value_idx = find_column(&names, &VALUE_COLUMNS)
            .ok_or_else(|| Error::MissingColumn(VALUE_COLUMNS[0].to_string()))?;
        let ts_idx = find_column(&names, &TIMESTAMP_COLUMNS);

        let values = cast(batch.column(value_idx), &DataType::Float64)
            .map_err(Error::from)
            .with_context(|| format!("casting '{}' to Float64", names[value_idx]))?;
        let values = values.as_primitive::<Float64Type>();

        let options = FormatOptions::default();
        let ts_formatter = match ts_idx {
            Some(i) => Some(
                ArrayFormatter::try_new(batch.column(i).as_ref(), &options)
                    .map_err(Error::from)
                    .context("formatting timestamp column")?,
            ),
            None => None,
        };

        // Metadata columns: everything except value and timestamp
        let meta_cols: Vec<(usize, &String)> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != value_idx && Some(*i) != ts_idx)
            .collect();

        for row in 0..batch.num_rows() {
            if values.is_null(row) || !values.value(row).is_finite() {
                skipped += 1;
                continue;
            }

            let timestamp = match (&ts_formatter, ts_idx) {
                (Some(fmt), Some(i)) if !batch.column(i).is_null(row) => {
                    Some(fmt.value(row).to_string())
                }
                _ => None,
            };

            let mut metadata = BTreeMap::new();
            for (col_idx, col_name) in &meta_cols {
                let value = extract_metadata_value(batch.column(*col_idx), row);
                metadata.insert((*col_name).clone(), value);
            }

            points.push(DataPoint {
                timestamp,
                value: values.value(row),
                metadata,
            });
        }
    }

    report_skipped("Parquet", skipped);
    Ok(Dataset::from_points(points))
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            MetadataValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Int32 => MetadataValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => MetadataValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            MetadataValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => MetadataValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => MetadataValue::Bool(col.as_boolean().value(row)),
        other => MetadataValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_uses_value_and_timestamp_columns() {
        let text = "timestamp,value,sensor\n\
                    2024-01-01,1.5,A\n\
                    2024-01-02,2.5,B\n";
        let ds = parse_csv_str(text).unwrap();
        assert_eq!(ds.values(), vec![1.5, 2.5]);
        assert_eq!(ds.points[0].timestamp.as_deref(), Some("2024-01-01"));
        assert_eq!(
            ds.points[1].metadata["sensor"],
            MetadataValue::String("B".to_string())
        );
        assert_eq!(ds.column_names, vec!["sensor".to_string()]);
    }

    #[test]
    fn csv_falls_back_to_date_and_measurement() {
        let text = "date,measurement\n2024-03-01,7\n";
        let ds = parse_csv_str(text).unwrap();
        assert_eq!(ds.values(), vec![7.0]);
        assert_eq!(ds.points[0].timestamp.as_deref(), Some("2024-03-01"));
        assert!(ds.column_names.is_empty());
    }

    #[test]
    fn csv_drops_non_numeric_rows() {
        let text = "timestamp,value\nt0,1\nt1,n/a\nt2,\nt3,NaN\nt4,4\n";
        let ds = parse_csv_str(text).unwrap();
        assert_eq!(ds.values(), vec![1.0, 4.0]);
        assert_eq!(ds.points[1].timestamp.as_deref(), Some("t4"));
    }

    #[test]
    fn csv_without_value_column_is_rejected() {
        let err = parse_csv_str("timestamp,reading\nt0,1\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingColumn(col)) if col == "value"
        ));
    }

    #[test]
    fn json_accepts_array_and_single_object() {
        let ds = parse_json_str(
            r#"[{"timestamp":"a","value":1},{"timestamp":"b","value":"2.5","region":"eu"}]"#,
        )
        .unwrap();
        assert_eq!(ds.values(), vec![1.0, 2.5]);
        assert_eq!(ds.points[1].metadata["region"], MetadataValue::String("eu".into()));

        let ds = parse_json_str(r#"{"date":"2024-01-01","measurement":3}"#).unwrap();
        assert_eq!(ds.values(), vec![3.0]);
        assert_eq!(ds.points[0].timestamp.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn json_skips_missing_values() {
        let ds = parse_json_str(r#"[{"value":null},{"value":true},{"other":1},{"value":5}]"#)
            .unwrap();
        assert_eq!(ds.values(), vec![5.0]);
    }

    #[test]
    fn json_null_value_falls_back_to_measurement() {
        let ds = parse_json_str(
            r#"[{"Date":"d0","value":null,"Measurement":4},{"TIMESTAMP":"t1","Value":6}]"#,
        )
        .unwrap();
        assert_eq!(ds.values(), vec![4.0, 6.0]);
        assert_eq!(ds.points[0].timestamp.as_deref(), Some("d0"));
        assert_eq!(ds.points[1].timestamp.as_deref(), Some("t1"));
        assert!(!ds.points[1].metadata.contains_key("Value"));
    }

    #[test]
    fn json_rejects_scalars_and_non_objects() {
        let err = parse_json_str("42").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidLayout(_))));

        let err = parse_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidLayout(_))));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = parse_json_str("{not json").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Json(_))));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }
}
