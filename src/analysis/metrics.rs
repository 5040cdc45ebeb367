use serde::Serialize;

use super::{humanize, numeric_values};
use crate::db::ResultSet;

const MAX_METRIC_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Count,
    Average,
    Maximum,
    Minimum,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSpec {
    pub title: String,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

/// Summary metrics: a record count, plus average/max/min for the first
/// three numeric columns. Computed whether or not charts were requested.
pub fn build_metrics(result: &ResultSet) -> Vec<MetricSpec> {
    if result.rows.is_empty() {
        return Vec::new();
    }

    let mut metrics = vec![MetricSpec {
        title: "Total Records".to_string(),
        value: result.row_count as f64,
        kind: MetricKind::Count,
    }];

    for col in result.numeric_columns().iter().take(MAX_METRIC_COLUMNS) {
        let values = numeric_values(result, col);
        if values.is_empty() {
            continue;
        }
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let name = humanize(&col.name);
        metrics.push(MetricSpec {
            title: format!("Average {name}"),
            value: (avg * 100.0).round() / 100.0,
            kind: MetricKind::Average,
        });
        metrics.push(MetricSpec {
            title: format!("Max {name}"),
            value: max,
            kind: MetricKind::Maximum,
        });
        metrics.push(MetricSpec {
            title: format!("Min {name}"),
            value: min,
            kind: MetricKind::Minimum,
        });
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_util::result_set;
    use serde_json::json;

    #[test]
    fn empty_result_yields_no_metrics() {
        let result = result_set(&[("x", true)], vec![]);
        assert!(build_metrics(&result).is_empty());
    }

    #[test]
    fn count_average_max_min_for_a_numeric_column() {
        let result = result_set(
            &[("x", true)],
            vec![vec![json!(2)], vec![json!(4)], vec![json!(6)]],
        );
        let metrics = build_metrics(&result);
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].kind, MetricKind::Count);
        assert_eq!(metrics[0].value, 3.0);
        assert_eq!(metrics[1].kind, MetricKind::Average);
        assert_eq!(metrics[1].title, "Average X");
        assert_eq!(metrics[1].value, 4.0);
        assert_eq!(metrics[2].kind, MetricKind::Maximum);
        assert_eq!(metrics[2].value, 6.0);
        assert_eq!(metrics[3].kind, MetricKind::Minimum);
        assert_eq!(metrics[3].value, 2.0);
    }

    #[test]
    fn average_is_rounded_to_two_decimals() {
        let result = result_set(
            &[("x", true)],
            vec![vec![json!(1)], vec![json!(1)], vec![json!(2)]],
        );
        let metrics = build_metrics(&result);
        assert_eq!(metrics[1].value, 1.33);
    }

    #[test]
    fn only_first_three_numeric_columns_get_metrics() {
        let result = result_set(
            &[("a", true), ("b", true), ("c", true), ("d", true)],
            vec![vec![json!(1), json!(2), json!(3), json!(4)]],
        );
        let metrics = build_metrics(&result);
        // count + 3 columns x 3 metrics
        assert_eq!(metrics.len(), 10);
        assert!(!metrics.iter().any(|m| m.title.contains('D')));
    }

    #[test]
    fn metric_discriminant_serializes_as_type() {
        let result = result_set(&[("x", true)], vec![vec![json!(1)], vec![json!(2)]]);
        let metrics = build_metrics(&result);
        let value = serde_json::to_value(&metrics[0]).unwrap();
        assert_eq!(value["type"], "count");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn nulls_are_ignored_in_aggregates() {
        let result = result_set(
            &[("x", true)],
            vec![vec![json!(null)], vec![json!(10)], vec![json!(20)]],
        );
        let metrics = build_metrics(&result);
        assert_eq!(metrics[1].value, 15.0);
        assert_eq!(metrics[3].value, 10.0);
    }
}
