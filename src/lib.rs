pub mod ai;
pub mod analysis;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod relationships;
pub mod server;

pub use error::QueryLensError;
pub use pipeline::{process_query, QueryResponse};
