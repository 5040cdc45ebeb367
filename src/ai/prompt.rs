//! Prompt assembly: pure text templating over the introspected schema, the
//! relationship graph, and the user's question. Deterministic — identical
//! inputs render byte-identical prompts.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;

use crate::db::{ColumnDescriptor, KeyRole, TableSchema};
use crate::relationships::{Confidence, RelationKind, Relationship, RelationshipGraph};

/// Fixed behavioral contract handed to the oracle with every request.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are an expert SQL query generator with deep knowledge of PostgreSQL syntax and \
relational database design. Convert natural language questions into precise, efficient \
SQL queries that properly utilize the table relationships provided.

CORE RESPONSIBILITIES:
1. Generate ONLY valid PostgreSQL SELECT statements
2. Use the JOIN patterns provided in the relationships section for any multi-table query
3. Prefer CONFIRMED FK relationships over inferred ones
4. Use consistent table aliases (t1, t2, ...) for readability
5. Use WHERE clauses, aggregations, GROUP BY and ORDER BY where the question implies them
6. Study the sample rows to understand actual value shapes before writing conditions

RESPONSE FORMAT:
- Return ONLY the SQL query text
- No explanations, no markdown, no code fences
- End with a semicolon";

fn column_line(col: &ColumnDescriptor) -> String {
    let mut desc = format!("{} ({})", col.name, col.declared_type);
    match col.key_role {
        KeyRole::Primary => desc.push_str(" [PRIMARY KEY]"),
        KeyRole::Unique => desc.push_str(" [UNIQUE]"),
        KeyRole::Indexed => desc.push_str(" [INDEX]"),
        KeyRole::None => {}
    }
    if !col.nullable {
        desc.push_str(" [NOT NULL]");
    }
    desc
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Schema section: per-table column list with key/null tags, followed by up
/// to 3 literal sample rows.
pub fn render_schema(schema: &BTreeMap<String, TableSchema>) -> String {
    let mut sections = Vec::with_capacity(schema.len());
    for table in schema.values() {
        let columns = table
            .columns
            .iter()
            .map(column_line)
            .collect::<Vec<_>>()
            .join(", ");
        let mut section = format!("Table: {}\nColumns: {}", table.name, columns);

        if !table.sample_rows.is_empty() {
            let _ = write!(section, "\n\nSample Data from {}:", table.name);
            for (i, row) in table.sample_rows.iter().enumerate() {
                let pairs = row
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = write!(section, "\nRow {}: {}", i + 1, pairs);
            }
        }
        sections.push(section);
    }
    sections.join(&format!("\n\n{}\n\n", "=".repeat(50)))
}

fn confidence_tag(rel: &Relationship) -> &'static str {
    if rel.kind == RelationKind::ForeignKey {
        "[CONFIRMED FK]"
    } else {
        match rel.confidence {
            Confidence::High => "[HIGH CONFIDENCE]",
            Confidence::Medium => "[MEDIUM CONFIDENCE]",
            Confidence::Confirmed => "[CONFIRMED FK]",
        }
    }
}

/// Relationship section: per-source listing with confidence tags, then a
/// flattened list of ready-to-use JOIN fragments.
pub fn render_relationships(graph: &RelationshipGraph) -> String {
    if graph.is_empty() {
        return "No table relationships detected.".to_string();
    }

    let mut out = String::from("TABLE RELATIONSHIPS:\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');

    for (source_table, rels) in graph {
        let _ = write!(out, "\nTable: {source_table}\n");
        for rel in rels {
            let _ = writeln!(
                out,
                "  - {} → {}.{} {}",
                rel.source_column,
                rel.target_table,
                rel.target_column,
                confidence_tag(rel)
            );
        }
    }

    out.push_str("\nJOIN PATTERNS:\n");
    out.push_str(&"-".repeat(30));
    out.push('\n');
    for (source_table, rels) in graph {
        for rel in rels {
            let _ = writeln!(
                out,
                "  JOIN {} ON {}.{} = {}.{}",
                rel.target_table,
                source_table,
                rel.source_column,
                rel.target_table,
                rel.target_column
            );
        }
    }

    out
}

/// The user-side prompt: schema, relationships, the question, and the
/// emphasis block the oracle is expected to honor.
pub fn build_user_prompt(
    schema: &BTreeMap<String, TableSchema>,
    graph: &RelationshipGraph,
    question: &str,
) -> String {
    format!(
        "Database Schema with Sample Data:\n{}\n\n{}\n\nNatural Language Query: {}\n\n\
         IMPORTANT:\n\
         1. Analyze the sample data carefully to understand the actual data shapes and values\n\
         2. Use the table relationships above for any multi-table query\n\
         3. Follow the exact JOIN patterns when connecting tables\n\
         4. Consider both confirmed foreign keys and high-confidence inferred relationships\n\n\
         Generate a PostgreSQL query that answers this question accurately based on the \
         structure and relationships shown above.",
        render_schema(schema),
        render_relationships(graph),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::build_graph;
    use serde_json::{json, Map};

    fn sample_schema() -> BTreeMap<String, TableSchema> {
        let mut users_row = Map::new();
        users_row.insert("id".to_string(), json!(1));
        users_row.insert("name".to_string(), json!("Ada"));
        users_row.insert("team_id".to_string(), json!(7));

        let users = TableSchema {
            name: "users".to_string(),
            columns: vec![
                ColumnDescriptor {
                    name: "id".to_string(),
                    declared_type: "integer".to_string(),
                    nullable: false,
                    key_role: KeyRole::Primary,
                    default_value: None,
                },
                ColumnDescriptor {
                    name: "name".to_string(),
                    declared_type: "text".to_string(),
                    nullable: true,
                    key_role: KeyRole::None,
                    default_value: None,
                },
                ColumnDescriptor {
                    name: "team_id".to_string(),
                    declared_type: "integer".to_string(),
                    nullable: true,
                    key_role: KeyRole::Indexed,
                    default_value: None,
                },
            ],
            sample_rows: vec![users_row],
        };
        let teams = TableSchema {
            name: "team".to_string(),
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                declared_type: "integer".to_string(),
                nullable: false,
                key_role: KeyRole::Primary,
                default_value: None,
            }],
            sample_rows: Vec::new(),
        };
        [users, teams]
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect()
    }

    #[test]
    fn schema_section_tags_keys_and_renders_samples() {
        let text = render_schema(&sample_schema());
        assert!(text.contains("id (integer) [PRIMARY KEY] [NOT NULL]"));
        assert!(text.contains("team_id (integer) [INDEX]"));
        assert!(text.contains("Sample Data from users:"));
        assert!(text.contains("Row 1: id: 1, name: Ada, team_id: 7"));
    }

    #[test]
    fn relationship_section_lists_tags_and_join_fragments() {
        let schema = sample_schema();
        let graph = build_graph(Vec::new(), &schema);
        let text = render_relationships(&graph);
        assert!(text.contains("team_id → team.id [HIGH CONFIDENCE]"));
        assert!(text.contains("JOIN team ON users.team_id = team.id"));
    }

    #[test]
    fn empty_graph_renders_fixed_sentence() {
        let graph = RelationshipGraph::new();
        assert_eq!(render_relationships(&graph), "No table relationships detected.");
    }

    #[test]
    fn prompt_is_byte_identical_across_invocations() {
        let schema = sample_schema();
        let graph = build_graph(Vec::new(), &schema);
        let a = build_user_prompt(&schema, &graph, "how many users per team?");
        let b = build_user_prompt(&schema, &graph, "how many users per team?");
        assert_eq!(a, b);
    }
}
