mod oracle;
pub mod prompt;
pub mod sanitize;

pub use oracle::*;
