use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio_postgres::Client;
use tracing::{info, warn};

use crate::db::query::{execute_query, quote_ident};
use crate::error::QueryLensError;
use crate::relationships::{Confidence, RelationKind, Relationship};

/// Schema searched for base tables. The service targets the default
/// application schema rather than taking it as request input.
pub const ACTIVE_SCHEMA: &str = "public";

const SAMPLE_ROW_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    None,
    Primary,
    Unique,
    Indexed,
}

/// Immutable snapshot of one column at introspection time.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub nullable: bool,
    pub key_role: KeyRole,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Up to 3 live rows in the engine's natural order; empty when sampling
    /// failed or the table is empty.
    pub sample_rows: Vec<Map<String, Value>>,
}

impl TableSchema {
    pub fn primary_key_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key_role == KeyRole::Primary)
    }
}

/// Read every base table's column metadata and a bounded row sample.
/// Failure to enumerate tables or columns is fatal; failure to sample a
/// single table degrades that table's sample to empty.
pub async fn read_schema(client: &Client) -> Result<BTreeMap<String, TableSchema>, QueryLensError> {
    let table_rows = client
        .query(
            "SELECT table_name
             FROM information_schema.tables
             WHERE table_schema = $1 AND table_type = 'BASE TABLE'
             ORDER BY table_name",
            &[&ACTIVE_SCHEMA],
        )
        .await
        .map_err(QueryLensError::SchemaIntrospection)?;

    let mut schema = BTreeMap::new();
    for table_row in &table_rows {
        let table_name: String = table_row.get(0);
        let columns = read_columns(client, &table_name).await?;
        let sample_rows = sample_table(client, &table_name).await;
        schema.insert(
            table_name.clone(),
            TableSchema {
                name: table_name,
                columns,
                sample_rows,
            },
        );
    }

    info!(
        "introspected {} tables in schema {}",
        schema.len(),
        ACTIVE_SCHEMA
    );
    Ok(schema)
}

async fn read_columns(
    client: &Client,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, QueryLensError> {
    let rows = client
        .query(
            "SELECT
                c.column_name,
                c.data_type,
                c.is_nullable = 'YES' as is_nullable,
                c.column_default,
                COALESCE(pk.is_pk, false) as is_primary_key,
                COALESCE(uq.is_unique, false) as is_unique,
                COALESCE(ix.is_indexed, false) as is_indexed
             FROM information_schema.columns c
             LEFT JOIN (
                SELECT kcu.column_name, true as is_pk
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                WHERE tc.constraint_type = 'PRIMARY KEY'
                    AND tc.table_schema = $1
                    AND tc.table_name = $2
             ) pk ON pk.column_name = c.column_name
             LEFT JOIN (
                SELECT kcu.column_name, true as is_unique
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                WHERE tc.constraint_type = 'UNIQUE'
                    AND tc.table_schema = $1
                    AND tc.table_name = $2
             ) uq ON uq.column_name = c.column_name
             LEFT JOIN (
                SELECT DISTINCT a.attname as column_name, true as is_indexed
                FROM pg_index i
                JOIN pg_class t ON t.oid = i.indrelid
                JOIN pg_namespace n ON n.oid = t.relnamespace
                JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(i.indkey)
                WHERE n.nspname = $1 AND t.relname = $2
             ) ix ON ix.column_name = c.column_name
             WHERE c.table_schema = $1 AND c.table_name = $2
             ORDER BY c.ordinal_position",
            &[&ACTIVE_SCHEMA, &table],
        )
        .await
        .map_err(QueryLensError::SchemaIntrospection)?;

    Ok(rows
        .iter()
        .map(|row| {
            let key_role = if row.get::<_, bool>(4) {
                KeyRole::Primary
            } else if row.get::<_, bool>(5) {
                KeyRole::Unique
            } else if row.get::<_, bool>(6) {
                KeyRole::Indexed
            } else {
                KeyRole::None
            };
            ColumnDescriptor {
                name: row.get(0),
                declared_type: row.get(1),
                nullable: row.get(2),
                key_role,
                default_value: row.get(3),
            }
        })
        .collect())
}

async fn sample_table(client: &Client, table: &str) -> Vec<Map<String, Value>> {
    let sql = format!(
        "SELECT * FROM {}.{} LIMIT {}",
        quote_ident(ACTIVE_SCHEMA),
        quote_ident(table),
        SAMPLE_ROW_LIMIT
    );
    match execute_query(client, &sql).await {
        Ok(result) => result.rows,
        Err(e) => {
            warn!("could not sample table {}: {}", table, e);
            Vec::new()
        }
    }
}

/// Declared foreign-key constraints for the active schema, as confirmed
/// relationship edges. Errors are the caller's to degrade on — insufficient
/// catalog privilege must not abort the request.
pub async fn declared_foreign_keys(client: &Client) -> Result<Vec<Relationship>, QueryLensError> {
    let rows = client
        .query(
            "SELECT
                tc.table_name as source_table,
                kcu.column_name as source_column,
                ccu.table_name as target_table,
                ccu.column_name as target_column
             FROM information_schema.table_constraints tc
             JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
             JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
             WHERE tc.constraint_type = 'FOREIGN KEY'
                AND tc.table_schema = $1
             ORDER BY tc.table_name, kcu.column_name",
            &[&ACTIVE_SCHEMA],
        )
        .await
        .map_err(QueryLensError::SchemaIntrospection)?;

    Ok(rows
        .iter()
        .map(|row| Relationship {
            source_table: row.get(0),
            source_column: row.get(1),
            target_table: row.get(2),
            target_column: row.get(3),
            kind: RelationKind::ForeignKey,
            confidence: Confidence::Confirmed,
        })
        .collect())
}
