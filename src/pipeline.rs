//! Per-request orchestration: connect, introspect, generate, execute,
//! analyze. Everything built here is request-scoped; the connection is
//! released on every exit path when the client drops.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::ai::prompt::{build_user_prompt, SYSTEM_INSTRUCTIONS};
use crate::ai::OracleClient;
use crate::analysis::{
    build_charts, build_insights, build_metrics, chart_needed, suitable_for_visualization,
    MetricSpec, VisualizationSpec,
};
use crate::db::{self, ConnectionParams};
use crate::error::QueryLensError;
use crate::relationships::{build_graph, RelationKind, RelationshipGraph};

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub metadata: ResponseMetadata,
    pub visualizations: Vec<VisualizationSpec>,
    pub metrics: Vec<MetricSpec>,
    pub insights: Vec<String>,
    pub graph_generated: bool,
    pub relationships: RelationshipGraph,
}

#[derive(Debug, Serialize)]
pub struct ResponseMetadata {
    pub raw_data: Vec<Map<String, Value>>,
    pub data_points: usize,
    pub generated_sql: String,
    pub chart_requested: bool,
    pub data_suitable_for_viz: bool,
    pub relationships_found: usize,
    pub tables_with_relationships: Vec<String>,
}

/// Run one natural-language query end to end.
pub async fn process_query(
    params: &ConnectionParams,
    question: &str,
    oracle: &OracleClient,
) -> Result<QueryResponse, QueryLensError> {
    if question.trim().is_empty() {
        return Err(QueryLensError::BadRequest("query must not be empty".into()));
    }

    info!("processing query: {}", question);
    let chart_requested = chart_needed(question);

    let client = db::connect(params).await?;

    let schema = db::read_schema(&client).await?;
    let declared = match db::declared_foreign_keys(&client).await {
        Ok(fks) => fks,
        Err(e) => {
            warn!("could not retrieve foreign key constraints: {}", e);
            Vec::new()
        }
    };
    let relationships = build_graph(declared, &schema);

    let user_prompt = build_user_prompt(&schema, &relationships, question);
    let sql = oracle.generate_sql(SYSTEM_INSTRUCTIONS, &user_prompt).await?;

    let result = db::execute_query(&client, &sql).await?;

    let visualizations = build_charts(&result, chart_requested);
    let metrics = build_metrics(&result);
    let insights = build_insights(&result);
    let graph_generated = !visualizations.is_empty();

    Ok(QueryResponse {
        metadata: ResponseMetadata {
            data_points: result.row_count,
            generated_sql: sql,
            chart_requested,
            data_suitable_for_viz: suitable_for_visualization(&result),
            relationships_found: relationships.len(),
            tables_with_relationships: relationships.keys().cloned().collect(),
            raw_data: result.rows,
        },
        visualizations,
        metrics,
        insights,
        graph_generated,
        relationships,
    })
}

#[derive(Debug, Serialize)]
pub struct SchemaReport {
    pub database: String,
    pub tables: usize,
    pub schema: std::collections::BTreeMap<String, db::TableSchema>,
    pub relationships: RelationshipGraph,
    pub relationship_summary: RelationshipSummary,
}

#[derive(Debug, Serialize)]
pub struct RelationshipSummary {
    pub total_relationships: usize,
    pub tables_with_relationships: usize,
    pub foreign_key_relationships: usize,
    pub inferred_relationships: usize,
}

/// Introspection-only pass, for inspecting what the prompt stage would see.
pub async fn inspect_schema(params: &ConnectionParams) -> Result<SchemaReport, QueryLensError> {
    let client = db::connect(params).await?;

    let schema = db::read_schema(&client).await?;
    let declared = match db::declared_foreign_keys(&client).await {
        Ok(fks) => fks,
        Err(e) => {
            warn!("could not retrieve foreign key constraints: {}", e);
            Vec::new()
        }
    };
    let relationships = build_graph(declared, &schema);

    let all_edges: Vec<_> = relationships.values().flatten().collect();
    let foreign_key_relationships = all_edges
        .iter()
        .filter(|r| r.kind == RelationKind::ForeignKey)
        .count();
    let relationship_summary = RelationshipSummary {
        total_relationships: all_edges.len(),
        tables_with_relationships: relationships.len(),
        foreign_key_relationships,
        inferred_relationships: all_edges.len() - foreign_key_relationships,
    };

    Ok(SchemaReport {
        database: params.database.clone(),
        tables: schema.len(),
        schema,
        relationships,
        relationship_summary,
    })
}
