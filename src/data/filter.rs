use std::collections::{BTreeMap, BTreeSet};

use super::model::{Dataset, MetadataValue};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column absent from the map imposes no constraint.
pub type FilterState = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Build a filter from `column=value` selectors. Repeating a column widens
/// its selection; values are typed like CSV cells.
pub fn parse_selectors<S: AsRef<str>>(selectors: &[S]) -> Result<FilterState> {
    let mut filters = FilterState::new();
    for sel in selectors {
        let sel = sel.as_ref();
        let (col, val) = sel
            .split_once('=')
            .ok_or_else(|| Error::InvalidSelector(sel.to_string()))?;
        filters
            .entry(col.trim().to_string())
            .or_default()
            .insert(MetadataValue::guess(val.trim()));
    }
    Ok(filters)
}

/// Return indices of points that pass all active filters.
///
/// A point passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * Every unique value of the column is selected → passes
/// * The point's value for that column is in the selected set → passes
/// * The point lacks the column → passes only if `Null` is selected
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .points
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            filters.iter().all(|(col, selected)| {
                if selected.is_empty() {
                    return false;
                }
                // Every known value selected → no effective filter
                if let Some(all_vals) = dataset.unique_values.get(col) {
                    if all_vals.is_subset(selected) {
                        return true;
                    }
                }
                match p.metadata.get(col) {
                    Some(val) => selected.contains(val),
                    None => selected.contains(&MetadataValue::Null),
                }
            })
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DataPoint;

    fn dataset() -> Dataset {
        let rows = [(1.0, Some("A")), (2.0, Some("B")), (3.0, Some("A")), (4.0, None)];
        let points = rows
            .iter()
            .map(|&(v, sensor)| {
                let mut p = DataPoint::new(None, v);
                if let Some(s) = sensor {
                    p.metadata
                        .insert("sensor".to_string(), MetadataValue::String(s.to_string()));
                }
                p
            })
            .collect();
        Dataset::from_points(points)
    }

    #[test]
    fn full_selection_is_no_filter() {
        let ds = dataset();
        let filters: FilterState = ds.unique_values.clone();
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2, 3]);
    }

    #[test]
    fn no_filters_keeps_everything() {
        let ds = dataset();
        assert_eq!(filtered_indices(&ds, &FilterState::new()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn selector_narrows_to_one_sensor() {
        let ds = dataset();
        let filters = parse_selectors(&["sensor=A"]).unwrap();
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 2]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = FilterState::new();
        filters.insert("sensor".to_string(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }

    #[test]
    fn missing_column_matches_null_selection() {
        let ds = dataset();
        let filters = parse_selectors(&["sensor="]).unwrap();
        assert_eq!(filtered_indices(&ds, &filters), vec![3]);
    }

    #[test]
    fn absent_values_keep_nothing_even_when_count_matches() {
        let ds = dataset();
        // Two selected values against two known ones, neither present.
        let filters = parse_selectors(&["sensor=X", "sensor=Y"]).unwrap();
        assert!(filtered_indices(&ds, &filters).is_empty());
    }

    #[test]
    fn single_valued_column_is_still_filtered() {
        let points = [1.0, 2.0]
            .iter()
            .map(|&v| {
                let mut p = DataPoint::new(None, v);
                p.metadata
                    .insert("sensor".to_string(), MetadataValue::String("A".to_string()));
                p
            })
            .collect();
        let ds = Dataset::from_points(points);

        let filters = parse_selectors(&["sensor=Z"]).unwrap();
        assert!(filtered_indices(&ds, &filters).is_empty());
        let filters = parse_selectors(&["sensor="]).unwrap();
        assert!(filtered_indices(&ds, &filters).is_empty());
        let filters = parse_selectors(&["sensor=A", "sensor=Z"]).unwrap();
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1]);
    }

    #[test]
    fn malformed_selector_is_rejected() {
        assert!(matches!(
            parse_selectors(&["sensor"]),
            Err(Error::InvalidSelector(s)) if s == "sensor"
        ));
    }
}
