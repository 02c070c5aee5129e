//! High-level report pipeline.
//!
//! Runs one export through every stage:
//! clean → read → parse → validate → classify → map → assemble → plan.
//! Each stage failure is reported as a [`PipelineError`] naming the stage
//! and the file.
//!
//! # Example
//!
//! ```rust,ignore
//! use wbsreport::cache::MasterDataCache;
//! use wbsreport::config::{ReportVariant, Settings};
//! use wbsreport::transform::pipeline::{generate_report, ReportOptions};
//! use std::path::Path;
//!
//! let settings = Settings::from_env();
//! let mut cache = MasterDataCache::new(settings.master_source());
//! let result = generate_report(
//!     Path::new("BUDGET.DAT"),
//!     ReportVariant::BudgetReport,
//!     &mut cache,
//!     &ReportOptions::from_settings(&settings),
//! )?;
//! println!("{} rows", result.report.rows.len());
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{MasterDataCache, MasterDataIndex, MasterDataPolicy};
use crate::cleaner::{clean_file, CleanedLines};
use crate::config::{ReportVariant, Settings, SourceFormat, VariantConfig};
use crate::error::{FileError, PipelineError, PipelineResult, Stage, StageError};
use crate::formatting::{build_plan, FormattingPlan};
use crate::logs::{log_info, log_info_indent, log_success, log_warning, LogEntry, RunLog};
use crate::models::{Classification, CleanedTable, WbsTable};
use crate::parser::{html::parse_html, parse_dat, read_source, SourceEncoding};
use crate::render::{render_html, write_csv};
use crate::validation::{validate_identifiers, validate_table};

use super::assembler::{assemble, ReportTable};
use super::detail::{extract_wbs_rows, DetailSource};
use super::hierarchy::{classify_table, ClassificationStrategy};
use super::mapper::{map_descriptions, MappingStats};

// =============================================================================
// Options & Result
// =============================================================================

/// Options for one report run
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Overrides the variant's classification strategy
    pub strategy: Option<ClassificationStrategy>,
    pub master_policy: MasterDataPolicy,
    /// Directory receiving the cleaned intermediate file
    pub work_dir: PathBuf,
    /// Keep the cleaned intermediate file after the run
    pub keep_cleaned: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            strategy: None,
            master_policy: MasterDataPolicy::WarnAndContinue,
            work_dir: std::env::temp_dir(),
            keep_cleaned: false,
        }
    }
}

impl ReportOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            master_policy: settings.master_policy(),
            work_dir: settings.work_dir.clone(),
            ..Self::default()
        }
    }
}

/// Result of a report run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub variant: ReportVariant,
    pub input: PathBuf,
    pub summary_export: bool,
    pub lines_removed: usize,
    pub classification: Classification,
    /// None when the run continued without master data
    pub mapping: Option<MappingStats>,
    /// Non-fatal findings (malformed identifiers)
    pub issues: Vec<String>,
    pub report: ReportTable,
    pub plan: FormattingPlan,
    /// Kept cleaned file, if requested
    pub cleaned_file: Option<PathBuf>,
    /// Log entries emitted during the run
    pub run_log: Vec<LogEntry>,
    pub generated_at: DateTime<Utc>,
}

impl ReportResult {
    pub fn master_applied(&self) -> bool {
        self.mapping.is_some()
    }
}

/// Parsed rows of one export, before classification.
#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub table: WbsTable,
    pub cleaned: CleanedLines,
    pub cleaned_file: Option<PathBuf>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Run the full pipeline for one export file.
///
/// The master index is resolved through `cache` under the options' policy;
/// with warn-and-continue an unavailable source leaves descriptions unmapped.
pub fn generate_report(
    path: &Path,
    variant: ReportVariant,
    cache: &mut MasterDataCache,
    options: &ReportOptions,
) -> PipelineResult<ReportResult> {
    let run = RunLog::start();
    let config = variant.config();
    log_info(format!("Generating {} from {}", config.title, path.display()));

    let loaded = load_export(path, &config, options)?;
    let issues = identifier_issues(&loaded.table);

    let strategy = options.strategy.unwrap_or(config.strategy);
    let classification = classify_table(&loaded.table, strategy);
    log_success(format!(
        "Classified {} identifier(s): {} summary, {} transaction",
        classification.len(),
        classification.summary.len(),
        classification.transaction.len()
    ));

    let master_path = cache.source().path.clone();
    let master = cache
        .resolve(options.master_policy)
        .map_err(PipelineError::at(Stage::MasterData, master_path))?;

    let mut table = loaded.table;
    let mapping = apply_master(&mut table, master);
    let report = assemble(table, &config);
    if report.dropped_rows > 0 {
        log_info_indent(format!("Dropped {} empty row(s)", report.dropped_rows), 1);
    }
    let plan = build_plan(&report, &classification, &config);
    log_success(format!(
        "{} ready: {} rows, {} columns",
        config.title,
        report.rows.len(),
        report.width()
    ));

    Ok(ReportResult {
        variant,
        input: path.to_path_buf(),
        summary_export: loaded.cleaned.summary_export,
        lines_removed: loaded.cleaned.removed,
        classification,
        mapping,
        issues,
        report,
        plan,
        cleaned_file: loaded.cleaned_file,
        run_log: run.finish(),
        generated_at: Utc::now(),
    })
}

/// Clean, parse and classify only.
pub fn classify_file(
    path: &Path,
    variant: ReportVariant,
    options: &ReportOptions,
) -> PipelineResult<Classification> {
    let config = variant.config();
    let loaded = load_export(path, &config, options)?;
    Ok(classify_table(
        &loaded.table,
        options.strategy.unwrap_or(config.strategy),
    ))
}

/// Clean `path` into the work directory, then parse and lift it into WBS rows.
pub fn load_export(
    path: &Path,
    config: &VariantConfig,
    options: &ReportOptions,
) -> PipelineResult<LoadedExport> {
    // 1. Clean
    let cleaned_path = cleaned_path(path, &options.work_dir);
    std::fs::create_dir_all(&options.work_dir)
        .map_err(FileError::io(&options.work_dir))
        .map_err(PipelineError::at(Stage::Clean, path))?;
    let cleaned = clean_file(path, &cleaned_path, &config.cleaning, config.encoding)
        .map_err(PipelineError::at(Stage::Clean, path))?;

    // 2. Read back
    let content = read_source(&cleaned_path, SourceEncoding::Utf8);
    let cleaned_file = if options.keep_cleaned {
        log_info_indent(format!("Cleaned file kept at {}", cleaned_path.display()), 1);
        Some(cleaned_path.clone())
    } else {
        if let Err(e) = std::fs::remove_file(&cleaned_path) {
            log_warning(format!("Could not remove {}: {}", cleaned_path.display(), e));
        }
        None
    };
    let content = content.map_err(PipelineError::at(Stage::Read, &cleaned_path))?;

    // 3. Parse
    let table = parse_content(&content, config).map_err(PipelineError::at(Stage::Parse, path))?;
    log_success(format!(
        "Read {} row(s) x {} column(s)",
        table.len(),
        table.width()
    ));

    // 4. Validate shape and lift rows
    let table = lift_rows(table, config, cleaned.summary_export)
        .map_err(PipelineError::at(Stage::Validate, path))?;

    Ok(LoadedExport {
        table,
        cleaned,
        cleaned_file,
    })
}

/// Output files requested for a finished report.
#[derive(Debug, Clone, Default)]
pub struct ReportOutputs {
    pub csv: Option<PathBuf>,
    pub plan: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl ReportOutputs {
    /// Resolve every requested path against the reports directory.
    pub fn resolved(self, settings: &Settings) -> Self {
        let resolve = |p: Option<PathBuf>| p.map(|p| settings.output_path(&p));
        Self {
            csv: resolve(self.csv),
            plan: resolve(self.plan),
            html: resolve(self.html),
        }
    }
}

/// Write the requested renderings; the plan is written as pretty JSON.
pub fn write_outputs(result: &ReportResult, outputs: &ReportOutputs) -> PipelineResult<()> {
    for path in [&outputs.csv, &outputs.plan, &outputs.html].into_iter().flatten() {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(FileError::io(dir))
                .map_err(PipelineError::at(Stage::Write, path))?;
        }
    }
    if let Some(path) = &outputs.csv {
        write_csv(&result.report, path).map_err(PipelineError::at(Stage::Write, path))?;
        log_success(format!("Report written to {}", path.display()));
    }
    if let Some(path) = &outputs.plan {
        let json = serde_json::to_string_pretty(&result.plan)
            .map_err(|e| PipelineError::new(Stage::Write, path, StageError::Output(e.to_string())))?;
        std::fs::write(path, json)
            .map_err(FileError::io(path))
            .map_err(PipelineError::at(Stage::Write, path))?;
        log_success(format!("Formatting plan written to {}", path.display()));
    }
    if let Some(path) = &outputs.html {
        std::fs::write(path, render_html(&result.report, &result.plan))
            .map_err(FileError::io(path))
            .map_err(PipelineError::at(Stage::Write, path))?;
        log_success(format!("Preview written to {}", path.display()));
    }
    Ok(())
}

// =============================================================================
// Stages
// =============================================================================

/// `<stem>_cleaned.<ext>` inside `work_dir`.
pub fn cleaned_path(input: &Path, work_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}_cleaned.{}", stem, ext.to_string_lossy()),
        None => format!("{}_cleaned", stem),
    };
    work_dir.join(name)
}

fn parse_content(content: &str, config: &VariantConfig) -> Result<CleanedTable, StageError> {
    let mut table = match config.format {
        SourceFormat::Dat => parse_dat(content)?,
        SourceFormat::Html => parse_html(content)?,
    };
    if config.drop_footer_rows > 0 {
        let keep = table.rows.len().saturating_sub(config.drop_footer_rows);
        table.rows.truncate(keep);
        log_info_indent(format!("Dropped {} footer row(s)", config.drop_footer_rows), 1);
    }
    Ok(table)
}

fn lift_rows(
    table: CleanedTable,
    config: &VariantConfig,
    summary_export: bool,
) -> Result<WbsTable, StageError> {
    let required: Vec<&str> = match &config.detail {
        DetailSource::ObjectField { field, .. } => vec![field.as_str()],
        DetailSource::Columns { .. } => Vec::new(),
    };
    validate_table(&table, &required, 1)?;
    Ok(extract_wbs_rows(table, &config.detail, summary_export)?)
}

fn identifier_issues(table: &WbsTable) -> Vec<String> {
    match validate_identifiers(table) {
        Ok(()) => Vec::new(),
        Err(errors) => {
            log_warning(format!("{} malformed identifier(s)", errors.len()));
            for e in errors.iter().take(3) {
                log_info_indent(e.to_string(), 1);
            }
            errors.iter().map(|e| e.to_string()).collect()
        }
    }
}

fn apply_master(table: &mut WbsTable, master: Option<&MasterDataIndex>) -> Option<MappingStats> {
    let index = master?;
    let stats = map_descriptions(&mut table.rows, index);
    log_success(format!(
        "Mapped {} description(s); {} identifier(s) not in master data",
        stats.mapped, stats.unmapped
    ));
    Some(stats)
}
