//! IO modules - the persistence boundary
//!
//! - `sales_writer` - per-register sales files (CSV or JSONL) for one processing day

pub mod sales_writer;

// Re-export commonly used types
pub use sales_writer::{FileSalesWriter, SalesSink, WriteSummary};
