//! Normalization of free-text oracle replies into a single executable SQL
//! statement. Kept separate from the HTTP call so the rules can be pinned
//! down with plain fixtures.

use crate::error::QueryLensError;

/// Reduce a raw reply to one statement: drop markdown fences, drop blank
/// and comment lines (`--`, `#`), rejoin with single spaces, ensure a
/// trailing semicolon.
pub fn normalize_reply(raw: &str) -> String {
    let unfenced = raw.replace("```sql", "").replace("```", "");

    let mut kept = Vec::new();
    for line in unfenced.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") || line.starts_with('#') {
            continue;
        }
        kept.push(line);
    }

    let mut sql = kept.join(" ").trim().to_string();
    if !sql.ends_with(';') {
        sql.push(';');
    }
    sql
}

/// The generator only ever accepts SELECT statements. Anything else —
/// refusals, prose, DML — fails with the offending text preserved.
pub fn validate_select(sql: &str) -> Result<(), QueryLensError> {
    if sql.trim_start().to_lowercase().starts_with("select") {
        Ok(())
    } else {
        Err(QueryLensError::InvalidGeneratedQuery {
            text: sql.to_string(),
        })
    }
}
