//! # WBS Report - ERP project-accounting exports to structured reports
//!
//! Turns the tab-delimited DAT and HTML table exports of an ERP
//! project-accounting module into clean, classified report tables with a
//! declarative formatting plan.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  DAT / HTML │────▶│   Cleaner   │────▶│   Parser    │────▶│  Transform  │────▶│   Report +  │
//! │   export    │     │ (boilerplate│     │ (two-row    │     │ (classify,  │     │   Plan      │
//! │             │     │   lines)    │     │   header)   │     │  map, build)│     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wbsreport::{generate_report, MasterDataCache, ReportOptions, ReportVariant, Settings};
//!
//! let settings = Settings::from_env();
//! let mut cache = MasterDataCache::new(settings.master_source());
//! let result = generate_report(
//!     "BUDGET.DAT".as_ref(),
//!     ReportVariant::BudgetReport,
//!     &mut cache,
//!     &ReportOptions::from_settings(&settings),
//! )?;
//! println!("{} summary identifiers", result.classification.summary.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and the terminal pipeline error
//! - [`logs`] - Run log broadcast
//! - [`config`] - Environment settings and report variants
//! - [`models`] - Tables, rows, identifiers and classification
//! - [`cleaner`] - Boilerplate line removal
//! - [`parser`] - Encoding, DAT and HTML table readers
//! - [`transform`] - Detail parsing, classification, mapping, assembly, pipeline
//! - [`validation`] - Identifier grammar and table shape checks
//! - [`cache`] - Master data index and cache
//! - [`formatting`] - Formatting plan and currency text
//! - [`render`] - CSV and HTML renderers
//! - [`analytics`] - Project-ID analytics

// Core modules
pub mod error;
pub mod logs;
pub mod config;
pub mod models;

// Reading
pub mod cleaner;
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Master data
pub mod cache;

// Output
pub mod formatting;
pub mod render;

// Analytics
pub mod analytics;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AnalyticsError, DataValidationError, FileError, MasterDataError, ParseError, PipelineError,
    Stage, StageError,
};

// =============================================================================
// Re-exports - Models & Config
// =============================================================================

pub use config::{ReportVariant, Settings, SourceFormat, VariantConfig};
pub use models::{CellValue, Classification, CleanedTable, ColumnKey, LevelMarker, WbsRow, WbsTable};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use cache::{MasterDataCache, MasterDataIndex, MasterDataPolicy};
pub use cleaner::{clean_file, clean_lines, CleaningPattern, CleaningRule};
pub use formatting::{build_plan, format_indian_currency, FormattingPlan};
pub use transform::pipeline::{
    classify_file, generate_report, write_outputs, ReportOptions, ReportOutputs, ReportResult,
};
pub use transform::{classify, classify_table, ClassificationStrategy};

// =============================================================================
// Re-exports - Analytics
// =============================================================================

pub use analytics::{analyze_file, type_wise_file, CodeBook, ContingencyTable, ProjectRecord};
