//! Post-processing of executed result sets into chart specs, summary
//! metrics, and insight sentences.

pub mod charts;
pub mod insights;
pub mod intent;
pub mod metrics;

pub use charts::{build_charts, suitable_for_visualization, ChartKind, VisualizationSpec};
pub use insights::build_insights;
pub use intent::chart_needed;
pub use metrics::{build_metrics, MetricKind, MetricSpec};

use serde_json::Value;

use crate::db::{ColumnDef, ResultSet};

/// `total_amount` → `Total Amount`, for human-facing titles.
pub(crate) fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn label_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Non-null numeric values of one column, in row order.
pub(crate) fn numeric_values(result: &ResultSet, column: &ColumnDef) -> Vec<f64> {
    result
        .rows
        .iter()
        .filter_map(|row| row.get(&column.name).and_then(Value::as_f64))
        .collect()
}

/// Per-distinct-value occurrence counts for one column, in first-seen
/// order. Nulls excluded.
pub(crate) fn frequency_table(result: &ResultSet, column: &ColumnDef) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in &result.rows {
        let Some(value) = label_string(row.get(&column.name)) else {
            continue;
        };
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
}

#[cfg(test)]
pub(crate) mod test_util {
    use serde_json::{Map, Value};

    use crate::db::{ColumnDef, ResultSet};

    /// Build a result set from (name, numeric) column tags and value rows.
    pub(crate) fn result_set(columns: &[(&str, bool)], rows: Vec<Vec<Value>>) -> ResultSet {
        let columns_def: Vec<ColumnDef> = columns
            .iter()
            .map(|(name, numeric)| ColumnDef {
                name: name.to_string(),
                data_type: if *numeric { "integer" } else { "text" }.to_string(),
                numeric: *numeric,
            })
            .collect();
        let records: Vec<Map<String, Value>> = rows
            .into_iter()
            .map(|row| {
                columns_def
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(row)
                    .collect()
            })
            .collect();
        let row_count = records.len();
        ResultSet {
            columns: columns_def,
            rows: records,
            row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_titles_column_names() {
        assert_eq!(humanize("total_amount"), "Total Amount");
        assert_eq!(humanize("name"), "Name");
        assert_eq!(humanize("AVG_price"), "Avg Price");
    }
}
