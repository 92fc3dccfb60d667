// Aggregation path expression parser

pub mod ast;
pub mod lexer;
pub mod path;

// Public API re-exports
pub use ast::{AggregationPath, BucketRole, Segment};
pub use path::parse_aggregation_path;
