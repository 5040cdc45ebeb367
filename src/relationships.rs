//! Relationship detection: declared foreign keys merged with
//! naming-convention inference over column names.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::db::{KeyRole, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ForeignKey,
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Only ever paired with [`RelationKind::ForeignKey`].
    Confirmed,
    High,
    Medium,
}

/// Directed edge: source_table.source_column references
/// target_table.target_column.
#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub kind: RelationKind,
    pub confidence: Confidence,
}

/// Sparse mapping from source table to its outgoing edges. Tables without
/// edges carry no entry. BTreeMap keeps prompt rendering deterministic.
pub type RelationshipGraph = BTreeMap<String, Vec<Relationship>>;

/// Column-name shapes that conventionally denote a reference to another
/// table; the capture is the referenced entity name. Tested in order.
static FK_NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(.+)_id$",
        r"^id_(.+)$",
        r"^(.+)id$",
        r"^fk_(.+)$",
        r"^(.+)_key$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Merge declared foreign keys with name-based inference into one graph.
/// Declared edges are inserted first, so a (source table, source column,
/// target table) triple present in both passes keeps its confirmed form.
pub fn build_graph(
    declared: Vec<Relationship>,
    schema: &BTreeMap<String, TableSchema>,
) -> RelationshipGraph {
    let inferred = infer_relationships(schema);

    let mut graph = RelationshipGraph::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    for rel in declared.into_iter().chain(inferred) {
        let pair = (
            rel.source_table.clone(),
            rel.source_column.clone(),
            rel.target_table.clone(),
        );
        if seen.insert(pair) {
            graph.entry(rel.source_table.clone()).or_default().push(rel);
        }
    }

    info!(
        "relationship graph: {} source tables, {} edges",
        graph.len(),
        graph.values().map(|v| v.len()).sum::<usize>()
    );
    graph
}

/// Naming-convention pass. Engine-independent: catches references that the
/// catalog does not declare, at reduced confidence. A candidate name that
/// exactly equals another table's name (case-insensitive) ranks High; a
/// substring match in either direction ranks Medium.
fn infer_relationships(schema: &BTreeMap<String, TableSchema>) -> Vec<Relationship> {
    let mut candidates = Vec::new();

    for (table_name, table) in schema {
        let table_lower = table_name.to_lowercase();
        for column in &table.columns {
            let col_lower = column.name.to_lowercase();

            // A table's own primary key named `<table>_id` or `id` is
            // self-reference noise, not a foreign key.
            if column.key_role == KeyRole::Primary
                && (col_lower == format!("{table_lower}_id") || col_lower == "id")
            {
                continue;
            }

            for pattern in FK_NAME_PATTERNS.iter() {
                let Some(caps) = pattern.captures(&col_lower) else {
                    continue;
                };
                let referenced = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                if referenced.is_empty() {
                    continue;
                }

                for (target_name, target) in schema {
                    if target_name == table_name {
                        continue;
                    }
                    let target_lower = target_name.to_lowercase();
                    let confidence = if referenced == target_lower {
                        Confidence::High
                    } else if target_lower.contains(referenced)
                        || referenced.contains(&target_lower)
                    {
                        Confidence::Medium
                    } else {
                        continue;
                    };

                    let target_column = target
                        .primary_key_column()
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| "id".to_string());

                    candidates.push(Relationship {
                        source_table: table_name.clone(),
                        source_column: column.name.clone(),
                        target_table: target_name.clone(),
                        target_column,
                        kind: RelationKind::Inferred,
                        confidence,
                    });
                }
            }
        }
    }

    candidates
}
