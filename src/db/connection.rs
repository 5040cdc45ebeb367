use serde::{Deserialize, Serialize};
use tokio_postgres::{Client, NoTls};
use tracing::info;

use crate::error::QueryLensError;

/// Connection parameters supplied with every request. Nothing here is
/// persisted; each request dials its own connection and drops it on exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl ConnectionParams {
    fn conn_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }
}

/// Open a request-scoped connection. The driver task ends when the returned
/// client is dropped, so every exit path of the caller releases the
/// connection.
pub async fn connect(params: &ConnectionParams) -> Result<Client, QueryLensError> {
    let (client, connection) = tokio_postgres::connect(&params.conn_string(), NoTls)
        .await
        .map_err(QueryLensError::Connection)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!("connection driver terminated: {}", e);
        }
    });

    info!(
        "connected to {} on {}:{}",
        params.database, params.host, params.port
    );
    Ok(client)
}

/// Connectivity probe behind /api/test-connection: dials, runs a trivial
/// query, reports the server version string.
pub async fn test_connection(params: &ConnectionParams) -> Result<String, QueryLensError> {
    let client = connect(params).await?;
    let row = client
        .query_one("SELECT version()", &[])
        .await
        .map_err(QueryLensError::Connection)?;
    Ok(row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_database_is_a_connection_error() {
        // Nothing listens on loopback port 1; the dial is refused outright.
        let params = ConnectionParams {
            host: "127.0.0.1".to_string(),
            port: 1,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        };
        let err = test_connection(&params).await.unwrap_err();
        assert!(matches!(err, QueryLensError::Connection(_)));
    }
}
