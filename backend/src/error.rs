//! Error types for the WBS report pipeline.
//!
//! One error enum per concern, converted upward with `#[from]`:
//!
//! - [`FileError`] - source files missing, empty, unreadable or badly encoded
//! - [`ParseError`] - malformed tabular content (DAT or HTML)
//! - [`DataValidationError`] - expected columns or rows absent
//! - [`MasterDataError`] - master-data source problems
//! - [`AnalyticsError`] - project-ID analytics failures
//! - [`PipelineError`] - the terminal error of a report run, naming stage and file
//!
//! Classification never fails, so there is no classification error.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

// =============================================================================
// File Errors
// =============================================================================

/// Errors reading or writing export files.
#[derive(Debug, Error)]
pub enum FileError {
    /// Source file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Path exists but is not a regular file.
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Source file has no lines.
    #[error("File is empty: {}", .0.display())]
    Empty(PathBuf),

    /// Underlying IO failure.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes could not be decoded with the declared encoding.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl FileError {
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> FileError {
        let path = path.as_ref().to_path_buf();
        move |source| FileError::Io { path, source }
    }
}

// =============================================================================
// Tabular Parse Errors
// =============================================================================

/// Errors turning cleaned text into a table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Fewer than the two header rows.
    #[error("Expected a two-row header, found {found} row(s)")]
    MissingHeader { found: usize },

    /// Delimiter structure does not form columns.
    #[error("Malformed table: {0}")]
    Malformed(String),

    /// HTML document contains no table.
    #[error("No table found in HTML document")]
    NoTable,

    /// CSV reader failure.
    #[error("Delimited read failed: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Data Validation Errors
// =============================================================================

/// Errors raised when a parsed table does not have the expected shape.
#[derive(Debug, Error)]
pub enum DataValidationError {
    /// Missing required column.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Not enough data rows.
    #[error("Insufficient data rows. Expected: {expected}, found: {found}")]
    InsufficientRows { expected: usize, found: usize },

    /// Identifier does not follow the WBS grammar.
    #[error("Malformed WBS identifier '{value}' at row {row}")]
    MalformedIdentifier { row: usize, value: String },
}

// =============================================================================
// Master Data Errors
// =============================================================================

/// Errors loading the identifier -> name master table.
#[derive(Debug, Error)]
pub enum MasterDataError {
    /// Master source file does not exist.
    #[error("Master data source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Required key/value column absent from the source header.
    #[error("Master data source {} has no '{field}' column", .path.display())]
    MissingField { path: PathBuf, field: String },

    /// Source exists but could not be read.
    #[error("Master data source {} unreadable: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    /// Extension is neither spreadsheet nor delimited text.
    #[error("Unsupported master data format: {0}")]
    UnsupportedFormat(String),
}

impl MasterDataError {
    /// True when the source is simply not available (as opposed to misconfigured).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            MasterDataError::SourceMissing(_) | MasterDataError::Unreadable { .. }
        )
    }
}

// =============================================================================
// Analytics Errors
// =============================================================================

/// Errors from the project-ID analytics extractor.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// No project identifiers matched; a cross-tabulation needs one observation.
    #[error("No project data found in {}", .0.display())]
    NoData(PathBuf),

    /// Reading the project file failed.
    #[error(transparent)]
    File(#[from] FileError),

    /// Reading a spreadsheet/CSV source failed.
    #[error(transparent)]
    Source(#[from] MasterDataError),

    /// Required column absent from a tabular source.
    #[error("Required column '{0}' not found")]
    MissingColumn(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Pipeline stage, used to label the terminal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Clean,
    Parse,
    Validate,
    MasterData,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Clean => "clean",
            Stage::Parse => "parse",
            Stage::Validate => "validate",
            Stage::MasterData => "master-data",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// The originating error of a failed stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] DataValidationError),

    #[error(transparent)]
    MasterData(#[from] MasterDataError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("{0}")]
    Output(String),
}

/// Terminal error of a report run.
///
/// The message names the failing stage and the offending file; `source()`
/// chains to the originating error.
#[derive(Debug, Error)]
#[error("{stage} failed for '{}': {source}", .path.display())]
pub struct PipelineError {
    pub stage: Stage,
    pub path: PathBuf,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, path: impl AsRef<Path>, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    /// Adapter for `map_err`: `.map_err(PipelineError::at(Stage::Parse, path))`.
    pub fn at<E: Into<StageError>>(
        stage: Stage,
        path: impl AsRef<Path>,
    ) -> impl FnOnce(E) -> PipelineError {
        let path = path.as_ref().to_path_buf();
        move |e| PipelineError::new(stage, path, e)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Result type for tabular parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for table validation.
pub type ValidationResult<T> = Result<T, DataValidationError>;

/// Result type for master-data operations.
pub type MasterDataResult<T> = Result<T, MasterDataError>;

/// Result type for analytics.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_pipeline_error_names_stage_and_path() {
        let err = PipelineError::new(
            Stage::Clean,
            "/data/budget.DAT",
            FileError::Empty(PathBuf::from("/data/budget.DAT")),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("clean failed"));
        assert!(msg.contains("/data/budget.DAT"));
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_pipeline_error_chains_source() {
        let err = PipelineError::at(Stage::Parse, "x.dat")(ParseError::MissingHeader { found: 1 });
        let source = err.source().expect("chained source");
        assert!(source.to_string().contains("two-row header"));
    }

    #[test]
    fn test_master_unavailable_vs_misconfigured() {
        assert!(MasterDataError::SourceMissing(PathBuf::from("m.xlsx")).is_unavailable());
        let misconfigured = MasterDataError::MissingField {
            path: PathBuf::from("m.csv"),
            field: "Name".into(),
        };
        assert!(!misconfigured.is_unavailable());
        assert!(misconfigured.to_string().contains("'Name'"));
    }
}
