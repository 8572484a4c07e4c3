use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed value from a non-value column of an uploaded row.
/// Kept in `BTreeMap` / `BTreeSet` downstream so `MetadataValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Type a raw text cell: integer, float, bool, or else string.
    pub fn guess(s: &str) -> MetadataValue {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// DataPoint – one row of an uploaded dataset
// ---------------------------------------------------------------------------

/// A single observation with its timestamp and any extra columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Raw timestamp text as uploaded; order in the dataset is time order.
    pub timestamp: Option<String>,
    /// The observed value, always finite.
    pub value: f64,
    /// Remaining columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl DataPoint {
    pub fn new(timestamp: Option<String>, value: f64) -> Self {
        DataPoint {
            timestamp,
            value,
            metadata: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded series
// ---------------------------------------------------------------------------

/// The parsed series with pre-computed metadata column indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All points, in upload order.
    pub points: Vec<DataPoint>,
    /// Ordered list of metadata column names (excludes timestamp and value).
    pub column_names: Vec<String>,
    /// For each metadata column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
}

impl Dataset {
    /// Build column indices from the loaded points.
    pub fn from_points(points: Vec<DataPoint>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();

        for p in &points {
            for (col, val) in &p.metadata {
                column_names_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names: Vec<String> = column_names_set.into_iter().collect();
        Dataset {
            points,
            column_names,
            unique_values,
        }
    }

    /// The numeric series handed to the scorer, aligned with `points`.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Keep only the points at `indices` (ascending), rebuilding the indices.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        let points = indices
            .iter()
            .filter_map(|&i| self.points.get(i).cloned())
            .collect();
        Dataset::from_points(points)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: f64, sensor: &str) -> DataPoint {
        let mut p = DataPoint::new(None, value);
        p.metadata
            .insert("sensor".to_string(), MetadataValue::String(sensor.to_string()));
        p
    }

    #[test]
    fn indexes_metadata_columns() {
        let ds = Dataset::from_points(vec![point(1.0, "b"), point(2.0, "a"), point(3.0, "b")]);
        assert_eq!(ds.column_names, vec!["sensor".to_string()]);
        assert_eq!(ds.unique_values["sensor"].len(), 2);
        assert_eq!(ds.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn subset_keeps_order() {
        let ds = Dataset::from_points(vec![point(1.0, "b"), point(2.0, "a"), point(3.0, "b")]);
        let sub = ds.subset(&[0, 2]);
        assert_eq!(sub.values(), vec![1.0, 3.0]);
        assert_eq!(sub.unique_values["sensor"].len(), 1);
    }

    #[test]
    fn guesses_cell_types() {
        assert_eq!(MetadataValue::guess(""), MetadataValue::Null);
        assert_eq!(MetadataValue::guess("7"), MetadataValue::Integer(7));
        assert_eq!(MetadataValue::guess("0.5"), MetadataValue::Float(0.5));
        assert_eq!(MetadataValue::guess("true"), MetadataValue::Bool(true));
        assert_eq!(
            MetadataValue::guess("north"),
            MetadataValue::String("north".to_string())
        );
    }

    #[test]
    fn ordering_groups_by_kind() {
        assert!(MetadataValue::Null < MetadataValue::Bool(false));
        assert!(MetadataValue::Integer(9) < MetadataValue::Float(0.0));
        assert!(MetadataValue::Float(-1.0) < MetadataValue::Float(1.0));
    }
}
