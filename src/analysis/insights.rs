use super::{frequency_table, numeric_values};
use crate::db::ResultSet;

const MAX_INSIGHT_COLUMNS: usize = 2;

/// Short textual observations over the result set: shape, numeric ranges,
/// and dominant categorical values.
pub fn build_insights(result: &ResultSet) -> Vec<String> {
    if result.rows.is_empty() {
        return vec!["No data available to generate insights.".to_string()];
    }

    let mut insights = vec![format!(
        "Dataset contains {} records with {} columns.",
        result.row_count,
        result.columns.len()
    )];

    for col in result.numeric_columns().iter().take(MAX_INSIGHT_COLUMNS) {
        let values = numeric_values(result, col);
        if values.is_empty() {
            continue;
        }
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        insights.push(format!(
            "The {} ranges from {} to {}, with an average of {:.2}.",
            col.name.replace('_', " "),
            min,
            max,
            avg
        ));
    }

    for col in result.categorical_columns().iter().take(MAX_INSIGHT_COLUMNS) {
        let counts = frequency_table(result, col);
        // Strictly-greater scan: ties keep the first-encountered value.
        let mut best: Option<&(String, usize)> = None;
        for entry in &counts {
            if best.map_or(true, |(_, n)| entry.1 > *n) {
                best = Some(entry);
            }
        }
        let Some((most_common, occurrences)) = best else {
            continue;
        };
        insights.push(format!(
            "The {} has {} unique values. Most common value is '{}' appearing {} times.",
            col.name.replace('_', " "),
            counts.len(),
            most_common,
            occurrences
        ));
    }

    insights
}
