//! Transformation module.
//!
//! - Detail: object field → level, description, identifier
//! - Hierarchy: summary/transaction classification
//! - Mapper: canonical descriptions from master data
//! - Assembler: report column order and serials
//! - Pipeline: the stages wired together

pub mod assembler;
pub mod detail;
pub mod hierarchy;
pub mod mapper;
pub mod pipeline;

pub use hierarchy::{classify, classify_table, ClassificationStrategy};
pub use pipeline::{generate_report, ReportOptions, ReportResult};
