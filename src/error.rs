use thiserror::Error;

/// Request-level failure taxonomy. Fatal variants abort the request;
/// degradations (failed relationship lookup, failed table sampling) are
/// handled in place and never become one of these.
#[derive(Error, Debug)]
pub enum QueryLensError {
    #[error("database connection failed: {0}")]
    Connection(#[source] tokio_postgres::Error),

    #[error("schema introspection failed: {0}")]
    SchemaIntrospection(#[source] tokio_postgres::Error),

    #[error("oracle request failed: {0}")]
    Oracle(String),

    /// The oracle reply did not normalize to a SELECT statement. The
    /// offending text is kept verbatim for diagnostics.
    #[error("generated response is not a valid SQL query. Got: {text}")]
    InvalidGeneratedQuery { text: String },

    /// The generated SQL was rejected by the database engine; the engine's
    /// error text is surfaced as-is.
    #[error("error executing query: {0}")]
    QueryExecution(String),

    #[error("{0}")]
    BadRequest(String),
}

impl QueryLensError {
    /// Bad input vs. internal failure, for HTTP status mapping.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryLensError::BadRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, QueryLensError>;
