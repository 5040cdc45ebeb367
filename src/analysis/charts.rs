use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::{frequency_table, humanize, label_string, numeric_values};
use crate::db::ResultSet;

const MIN_ROWS: usize = 2;
const MAX_ROWS: usize = 1000;
const MAX_PIE_SLICES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

/// Chart-ready series: stateless, derived per request.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Result sets outside 2..=1000 rows, or without columns, are not charted.
pub fn suitable_for_visualization(result: &ResultSet) -> bool {
    (MIN_ROWS..=MAX_ROWS).contains(&result.row_count) && !result.columns.is_empty()
}

/// Build chart specs for the result set. Strategies are mutually exclusive
/// and tried in order: categorical+numeric, numeric-only, categorical-only.
pub fn build_charts(result: &ResultSet, needs_chart: bool) -> Vec<VisualizationSpec> {
    if !needs_chart || !suitable_for_visualization(result) {
        return Vec::new();
    }

    let numeric = result.numeric_columns();
    let categorical = result.categorical_columns();

    if let (Some(cat_col), Some(num_col)) = (categorical.first(), numeric.first()) {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for row in &result.rows {
            let label = label_string(row.get(&cat_col.name));
            let value = row.get(&num_col.name).and_then(Value::as_f64);
            if let (Some(label), Some(value)) = (label, value) {
                labels.push(label);
                values.push(value);
            }
        }
        if labels.is_empty() {
            return Vec::new();
        }

        let mut charts = vec![VisualizationSpec {
            kind: ChartKind::Bar,
            title: format!("{} by {}", humanize(&num_col.name), humanize(&cat_col.name)),
            labels: labels.clone(),
            values: values.clone(),
        }];
        let distinct: HashSet<&String> = labels.iter().collect();
        if distinct.len() <= MAX_PIE_SLICES {
            charts.push(VisualizationSpec {
                kind: ChartKind::Pie,
                title: format!(
                    "{} Distribution by {}",
                    humanize(&num_col.name),
                    humanize(&cat_col.name)
                ),
                labels,
                values,
            });
        }
        charts
    } else if !numeric.is_empty() {
        // Pure numeric data: one bar chart per column with synthetic row labels.
        let mut charts = Vec::new();
        for col in numeric.iter().take(2) {
            let values = numeric_values(result, col);
            if values.is_empty() {
                continue;
            }
            let labels = (1..=values.len()).map(|i| format!("Row {i}")).collect();
            charts.push(VisualizationSpec {
                kind: ChartKind::Bar,
                title: format!("{} Distribution", humanize(&col.name)),
                labels,
                values,
            });
        }
        charts
    } else if let Some(col) = categorical.first() {
        // Pure categorical data: chart the value frequencies.
        let counts = frequency_table(result, col);
        if counts.len() <= 1 || counts.len() > MAX_PIE_SLICES {
            return Vec::new();
        }
        let labels: Vec<String> = counts.iter().map(|(v, _)| v.clone()).collect();
        let values: Vec<f64> = counts.iter().map(|(_, n)| *n as f64).collect();
        vec![
            VisualizationSpec {
                kind: ChartKind::Pie,
                title: format!("{} Distribution", humanize(&col.name)),
                labels: labels.clone(),
                values: values.clone(),
            },
            VisualizationSpec {
                kind: ChartKind::Bar,
                title: format!("{} Count", humanize(&col.name)),
                labels,
                values,
            },
        ]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_util::result_set;
    use serde_json::json;

    fn dept_amount_rows(n: usize) -> ResultSet {
        let rows = (0..n)
            .map(|i| vec![json!(format!("dept_{}", i % 3)), json!(i as i64)])
            .collect();
        result_set(&[("dept", false), ("amt", true)], rows)
    }

    #[test]
    fn single_row_is_not_charted() {
        let result = dept_amount_rows(1);
        assert!(build_charts(&result, true).is_empty());
    }

    #[test]
    fn two_rows_is_the_smallest_charted_result() {
        assert!(!build_charts(&dept_amount_rows(2), true).is_empty());
    }

    #[test]
    fn thousand_rows_is_still_charted_but_one_more_is_not() {
        assert!(!build_charts(&dept_amount_rows(1000), true).is_empty());
        assert!(build_charts(&dept_amount_rows(1001), true).is_empty());
    }

    #[test]
    fn no_charts_when_not_requested() {
        let result = dept_amount_rows(10);
        assert!(build_charts(&result, false).is_empty());
    }

    #[test]
    fn categorical_and_numeric_yields_bar_then_pie() {
        let result = result_set(
            &[("dept", false), ("amt", true)],
            vec![
                vec![json!("A"), json!(10)],
                vec![json!("B"), json!(20)],
                vec![json!("A"), json!(5)],
            ],
        );
        let charts = build_charts(&result, true);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].kind, ChartKind::Bar);
        assert_eq!(charts[0].labels, vec!["A", "B", "A"]);
        assert_eq!(charts[0].values, vec![10.0, 20.0, 5.0]);
        assert_eq!(charts[1].kind, ChartKind::Pie);
        assert_eq!(charts[1].labels, charts[0].labels);
    }

    #[test]
    fn pie_is_skipped_past_ten_distinct_labels() {
        let rows = (0..12)
            .map(|i| vec![json!(format!("cat{i}")), json!(i)])
            .collect();
        let result = result_set(&[("cat", false), ("n", true)], rows);
        let charts = build_charts(&result, true);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].kind, ChartKind::Bar);
    }

    #[test]
    fn null_rows_are_excluded_from_series() {
        let result = result_set(
            &[("dept", false), ("amt", true)],
            vec![
                vec![json!("A"), json!(10)],
                vec![json!(null), json!(20)],
                vec![json!("C"), json!(null)],
                vec![json!("D"), json!(7)],
            ],
        );
        let charts = build_charts(&result, true);
        assert_eq!(charts[0].labels, vec!["A", "D"]);
        assert_eq!(charts[0].values, vec![10.0, 7.0]);
    }

    #[test]
    fn numeric_only_uses_row_labels_and_caps_at_two_columns() {
        let result = result_set(
            &[("a", true), ("b", true), ("c", true)],
            vec![
                vec![json!(1), json!(4), json!(7)],
                vec![json!(2), json!(5), json!(8)],
            ],
        );
        let charts = build_charts(&result, true);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].labels, vec!["Row 1", "Row 2"]);
        assert_eq!(charts[0].values, vec![1.0, 2.0]);
        assert_eq!(charts[1].title, "B Distribution");
    }

    #[test]
    fn categorical_only_charts_frequencies_in_first_seen_order() {
        let result = result_set(
            &[("status", false)],
            vec![
                vec![json!("open")],
                vec![json!("closed")],
                vec![json!("open")],
            ],
        );
        let charts = build_charts(&result, true);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].kind, ChartKind::Pie);
        assert_eq!(charts[0].labels, vec!["open", "closed"]);
        assert_eq!(charts[0].values, vec![2.0, 1.0]);
        assert_eq!(charts[1].kind, ChartKind::Bar);
    }

    #[test]
    fn single_distinct_category_is_not_charted() {
        let result = result_set(
            &[("status", false)],
            vec![vec![json!("open")], vec![json!("open")]],
        );
        assert!(build_charts(&result, true).is_empty());
    }
}
