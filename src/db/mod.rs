mod connection;
mod introspection;
mod query;

pub use connection::{connect, test_connection, ConnectionParams};
pub use introspection::{
    declared_foreign_keys, read_schema, ColumnDescriptor, KeyRole, TableSchema, ACTIVE_SCHEMA,
};
pub use query::{execute_query, quote_ident, ColumnDef, ResultSet};
