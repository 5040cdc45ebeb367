use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_postgres::types::Type;
use tokio_postgres::Client;
use tracing::info;

use crate::error::QueryLensError;

/// One executed query's result: column metadata plus uniform records in row
/// order. Immutable once produced, discarded with the request.
#[derive(Debug, Serialize)]
pub struct ResultSet {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Map<String, Value>>,
    pub row_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    /// Computed once from the declared postgres column type, never from
    /// sampled values (a null or string-shaped first row must not flip it).
    pub numeric: bool,
}

impl ResultSet {
    pub fn numeric_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| c.numeric).collect()
    }

    pub fn categorical_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| !c.numeric).collect()
    }
}

pub async fn execute_query(client: &Client, sql: &str) -> Result<ResultSet, QueryLensError> {
    let stmt = client
        .prepare(sql)
        .await
        .map_err(|e| QueryLensError::QueryExecution(e.to_string()))?;
    let rows = client
        .query(&stmt, &[])
        .await
        .map_err(|e| QueryLensError::QueryExecution(e.to_string()))?;

    let columns: Vec<ColumnDef> = stmt
        .columns()
        .iter()
        .map(|col| ColumnDef {
            name: col.name().to_string(),
            data_type: pg_type_to_string(col.type_()),
            numeric: is_numeric_type(col.type_()),
        })
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut record = Map::new();
        for (i, col) in stmt.columns().iter().enumerate() {
            record.insert(col.name().to_string(), pg_value_to_json(row, i, col.type_()));
        }
        records.push(record);
    }

    let row_count = records.len();
    info!("query returned {} rows", row_count);

    Ok(ResultSet {
        columns,
        rows: records,
        row_count,
    })
}

pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn is_numeric_type(pg_type: &Type) -> bool {
    matches!(
        *pg_type,
        Type::INT2 | Type::INT4 | Type::INT8 | Type::FLOAT4 | Type::FLOAT8 | Type::NUMERIC
    )
}

fn pg_type_to_string(pg_type: &Type) -> String {
    match *pg_type {
        Type::BOOL => "boolean".into(),
        Type::INT2 => "smallint".into(),
        Type::INT4 => "integer".into(),
        Type::INT8 => "bigint".into(),
        Type::FLOAT4 => "real".into(),
        Type::FLOAT8 => "double precision".into(),
        Type::NUMERIC => "numeric".into(),
        Type::VARCHAR => "varchar".into(),
        Type::TEXT => "text".into(),
        Type::BPCHAR => "char".into(),
        Type::TIMESTAMP => "timestamp".into(),
        Type::TIMESTAMPTZ => "timestamptz".into(),
        Type::DATE => "date".into(),
        Type::TIME => "time".into(),
        Type::UUID => "uuid".into(),
        Type::JSON => "json".into(),
        Type::JSONB => "jsonb".into(),
        Type::BYTEA => "bytea".into(),
        _ => pg_type.name().to_string(),
    }
}

fn pg_value_to_json(row: &tokio_postgres::Row, idx: usize, pg_type: &Type) -> Value {
    // Extract by declared type, falling back to a text representation.
    match *pg_type {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Type::NUMERIC => row
            .try_get::<_, Option<rust_decimal::Decimal>>(idx)
            .ok()
            .flatten()
            .and_then(|v| v.to_f64())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<Value>>(idx)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
