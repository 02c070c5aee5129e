//! WBS Report CLI - Turn ERP project-accounting exports into reports
//!
//! # Main Commands
//!
//! ```bash
//! wbsreport report BUDGET.DAT --variant budget-report --output report.csv
//! wbsreport analytics PLAN.DAT                 # Projects by company and type
//! wbsreport type-wise CN42N.xlsx               # Unique projects per company/type
//! wbsreport master show                        # Master data status
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! wbsreport clean BUDGET.DAT --variant budget-report     # Cleaner only
//! wbsreport classify BUDGET.DAT --variant budget-report  # Classification as JSON
//! wbsreport variants                                     # Variant configuration
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use wbsreport::analytics::{analyze_file, type_wise_file, CodeBook};
use wbsreport::cleaner::clean_file;
use wbsreport::transform::pipeline::cleaned_path;
use wbsreport::{
    classify_file, generate_report, write_outputs, ClassificationStrategy, MasterDataCache,
    MasterDataPolicy, ReportOptions, ReportOutputs, ReportVariant, Settings,
};

#[derive(Parser)]
#[command(name = "wbsreport")]
#[command(about = "Clean, classify and assemble WBS reports from ERP exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: clean → parse → classify → map → assemble → plan
    Report {
        /// Input export (DAT or HTML)
        input: PathBuf,

        /// Report variant
        #[arg(short, long, value_enum)]
        variant: ReportVariant,

        /// Master data file (overrides WBSREPORT_MASTER_FILE)
        #[arg(short, long)]
        master: Option<PathBuf>,

        /// Fail when master data is unavailable
        #[arg(long)]
        strict_master: bool,

        /// Write the report as CSV; bare names go to WBSREPORT_REPORTS_DIR (default: JSON result on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the formatting plan as JSON
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Write an HTML preview
        #[arg(long)]
        html: Option<PathBuf>,

        /// Keep the cleaned intermediate file
        #[arg(long)]
        keep_cleaned: bool,
    },

    /// Run the line cleaner only
    Clean {
        /// Input export
        input: PathBuf,

        /// Report variant
        #[arg(short, long, value_enum)]
        variant: ReportVariant,

        /// Cleaned file (default: <stem>_cleaned.<ext> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify identifiers into summary and transaction
    Classify {
        /// Input export
        input: PathBuf,

        /// Report variant
        #[arg(short, long, value_enum)]
        variant: ReportVariant,

        /// Override the variant's strategy
        #[arg(short, long, value_enum)]
        strategy: Option<ClassificationStrategy>,
    },

    /// Count projects by type and company
    Analytics {
        /// Input export
        input: PathBuf,

        /// Write records and table as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Unique projects per company/type group
    TypeWise {
        /// Spreadsheet or CSV with a 'Project definition' column
        input: PathBuf,
    },

    /// Inspect master data
    Master {
        #[command(subcommand)]
        action: MasterAction,
    },

    /// Show the configuration of every report variant
    Variants,
}

#[derive(Subcommand)]
enum MasterAction {
    /// Load the master file and show its status
    Show {
        /// Master data file (overrides WBSREPORT_MASTER_FILE)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Look up the canonical name of an identifier
    Lookup {
        /// WBS identifier
        id: String,
        /// Master data file (overrides WBSREPORT_MASTER_FILE)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() {
    let settings = Settings::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            input,
            variant,
            master,
            strict_master,
            output,
            plan,
            html,
            keep_cleaned,
        } => cmd_report(
            &settings,
            &input,
            variant,
            master,
            strict_master,
            ReportOutputs { csv: output, plan, html },
            keep_cleaned,
        ),

        Commands::Clean {
            input,
            variant,
            output,
        } => cmd_clean(&input, variant, output.as_deref()),

        Commands::Classify {
            input,
            variant,
            strategy,
        } => cmd_classify(&settings, &input, variant, strategy),

        Commands::Analytics { input, output } => cmd_analytics(&input, output.as_deref()),

        Commands::TypeWise { input } => cmd_type_wise(&input),

        Commands::Master { action } => cmd_master(&settings, action),

        Commands::Variants => cmd_variants(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn master_cache(settings: &Settings, file: Option<PathBuf>) -> MasterDataCache {
    let mut source = settings.master_source();
    if let Some(file) = file {
        source.path = file;
    }
    MasterDataCache::new(source)
}

fn cmd_report(
    settings: &Settings,
    input: &Path,
    variant: ReportVariant,
    master: Option<PathBuf>,
    strict_master: bool,
    outputs: ReportOutputs,
    keep_cleaned: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {} ({})", input.display(), variant);

    let mut options = ReportOptions::from_settings(settings);
    options.keep_cleaned = keep_cleaned;
    if strict_master {
        options.master_policy = MasterDataPolicy::Strict;
    }
    let mut cache = master_cache(settings, master);

    let result = generate_report(input, variant, &mut cache, &options)?;

    eprintln!("   Rows: {} ({} empty dropped)", result.report.rows.len(), result.report.dropped_rows);
    eprintln!(
        "   Summary: {}, transaction: {}{}",
        result.classification.summary.len(),
        result.classification.transaction.len(),
        if result.summary_export { " (summary export)" } else { "" }
    );
    match &result.mapping {
        Some(stats) => eprintln!("   Master data: {} mapped, {} unmapped", stats.mapped, stats.unmapped),
        None => eprintln!("   Master data: not applied"),
    }
    for issue in result.issues.iter().take(5) {
        eprintln!("   - {}", issue);
    }

    let outputs = outputs.resolved(settings);
    let wrote_csv = outputs.csv.is_some();
    write_outputs(&result, &outputs)?;
    if !wrote_csv {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    eprintln!("Done!");
    Ok(())
}

fn cmd_clean(
    input: &Path,
    variant: ReportVariant,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = variant.config();
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => cleaned_path(input, input.parent().unwrap_or(Path::new("."))),
    };

    let cleaned = clean_file(input, &output, &config.cleaning, config.encoding)?;

    eprintln!("   Removed: {} line(s)", cleaned.removed);
    eprintln!("   Remaining: {} line(s)", cleaned.lines.len());
    eprintln!(
        "   Export: {}",
        if cleaned.summary_export { "summary (all projects)" } else { "single project" }
    );
    eprintln!("Output written to: {}", output.display());
    Ok(())
}

fn cmd_classify(
    settings: &Settings,
    input: &Path,
    variant: ReportVariant,
    strategy: Option<ClassificationStrategy>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ReportOptions::from_settings(settings);
    options.strategy = strategy;

    let classification = classify_file(input, variant, &options)?;
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

fn cmd_analytics(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Analysing: {}", input.display());

    let analysis = analyze_file(input, &CodeBook::default())?;

    let rows = analysis.table.to_rows();
    let widths: Vec<usize> = (0..rows[0].len())
        .map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
        .collect();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = *w)
                } else {
                    format!("{:>w$}", cell, w = *w)
                }
            })
            .collect();
        println!("{}", line.join("  "));
    }

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(&analysis)?)?;
        eprintln!("Output written to: {}", path.display());
    }
    Ok(())
}

fn cmd_type_wise(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let groups = type_wise_file(input, &CodeBook::default())?;

    println!("{:<24}  Number of Unique Projects", "Project");
    for group in &groups {
        println!("{:<24}  {}", group.name, group.unique_projects());
    }
    Ok(())
}

fn cmd_master(settings: &Settings, action: MasterAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MasterAction::Show { file } => {
            let mut cache = master_cache(settings, file);
            let source = cache.source().clone();
            let index = cache.get_or_load()?;

            println!("Master data: {}", source.path.display());
            println!("   Key field: {}", source.key_field);
            println!("   Value field: {}", source.value_field);
            println!("   Entries: {}", index.len());
            println!("   Duplicates: {}", index.duplicates);
            println!("   Loaded: {}", index.loaded_at);
        }

        MasterAction::Lookup { id, file } => {
            let mut cache = master_cache(settings, file);
            let index = cache.get_or_load()?;
            match index.lookup(&id) {
                Some(name) => println!("{} → {}", id.trim(), name),
                None => return Err(format!("Identifier not found: {}", id.trim()).into()),
            }
        }
    }
    Ok(())
}

fn cmd_variants() -> Result<(), Box<dyn std::error::Error>> {
    let configs: Vec<_> = ReportVariant::ALL.iter().map(|v| v.config()).collect();
    println!("{}", serde_json::to_string_pretty(&configs)?);
    Ok(())
}
