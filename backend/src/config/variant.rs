//! Report variants and the parameters that distinguish them.
//!
//! Every variant runs the same pipeline. [`ReportVariant::config`] is the
//! single place where they differ.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cleaner::{CleaningPattern, CleaningRule};
use crate::models::{ColumnKey, WBS_INFO_CATEGORY};
use crate::parser::SourceEncoding;
use crate::transform::assembler::{DerivedColumn, DerivedField};
use crate::transform::detail::{DetailLayout, DetailSource, FieldOrder, IdLocator};
use crate::transform::hierarchy::ClassificationStrategy;

/// Summary-row fill for the DAT reports.
pub const GREEN_FILL: &str = "90EE90";
/// Summary-row fill for the HTML variance report.
pub const ORANGE_FILL: &str = "FFA500";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportVariant {
    /// Standard budget report (DAT)
    BudgetReport,
    /// Budget updates (DAT)
    BudgetUpdates,
    /// Plan variance (DAT)
    PlanVariance,
    /// Budget variance (HTML)
    BudgetVariance,
}

impl ReportVariant {
    pub const ALL: [ReportVariant; 4] = [
        ReportVariant::BudgetReport,
        ReportVariant::BudgetUpdates,
        ReportVariant::PlanVariance,
        ReportVariant::BudgetVariance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportVariant::BudgetReport => "budget-report",
            ReportVariant::BudgetUpdates => "budget-updates",
            ReportVariant::PlanVariance => "plan-variance",
            ReportVariant::BudgetVariance => "budget-variance",
        }
    }

    pub fn config(&self) -> VariantConfig {
        match self {
            ReportVariant::BudgetReport => VariantConfig {
                variant: *self,
                title: "Budget Report",
                format: SourceFormat::Dat,
                encoding: SourceEncoding::Latin1,
                cleaning: CleaningRule::SentinelCheck {
                    sentinel: "Object".to_string(),
                    line_index: 2,
                    single: CleaningPattern::new(&[0, 3, 4, -1]),
                    summary: CleaningPattern::new(&[0, 1, 4, -1]),
                },
                detail: DetailSource::ObjectField {
                    field: "Object".to_string(),
                    layout: DetailLayout {
                        order: FieldOrder::LevelDescriptionId,
                        locator: IdLocator::Pattern,
                        noise_tokens: vec!["PRJ".to_string()],
                    },
                },
                ..Self::dat_defaults(*self)
            },
            ReportVariant::BudgetUpdates => VariantConfig {
                title: "Budget Updates",
                ..Self::dat_defaults(*self)
            },
            ReportVariant::PlanVariance => VariantConfig {
                title: "Plan Variance",
                ..Self::dat_defaults(*self)
            },
            ReportVariant::BudgetVariance => VariantConfig {
                variant: *self,
                title: "Budget Variance",
                format: SourceFormat::Html,
                encoding: SourceEncoding::Utf8,
                cleaning: CleaningRule::Fixed(CleaningPattern::new(&[0, 1])),
                detail: DetailSource::Columns {
                    id_column: 0,
                    description_column: 1,
                },
                strategy: ClassificationStrategy::SuffixLookup,
                drop_footer_rows: 1,
                header_suffix_trim: Some('1'),
                label_separator: " ",
                serial_label: "SI_NO",
                derived_columns: vec![
                    DerivedColumn::new(DerivedField::Id, ColumnKey::new("", "WBS_element")),
                    DerivedColumn::new(DerivedField::Description, ColumnKey::new("", "Description")),
                ],
                highlight_fill: ORANGE_FILL,
                freeze_pane: "D3",
                header_rows: 1,
            },
        }
    }

    /// Shared by the tab-delimited variants; budget updates and plan variance use it unchanged.
    fn dat_defaults(variant: ReportVariant) -> VariantConfig {
        VariantConfig {
            variant,
            title: "",
            format: SourceFormat::Dat,
            encoding: SourceEncoding::Latin1,
            cleaning: CleaningRule::Fixed(CleaningPattern::new(&[0, 3, -1])),
            detail: DetailSource::ObjectField {
                field: "Object".to_string(),
                layout: DetailLayout {
                    order: FieldOrder::LevelIdDescription,
                    locator: IdLocator::Positional,
                    noise_tokens: Vec::new(),
                },
            },
            strategy: ClassificationStrategy::AllPairs,
            drop_footer_rows: 0,
            header_suffix_trim: None,
            label_separator: " - ",
            serial_label: "Sl No.",
            derived_columns: vec![
                DerivedColumn::new(DerivedField::Level, ColumnKey::new(WBS_INFO_CATEGORY, "Level")),
                DerivedColumn::new(
                    DerivedField::Description,
                    ColumnKey::new(WBS_INFO_CATEGORY, "Description"),
                ),
                DerivedColumn::new(DerivedField::Id, ColumnKey::new(WBS_INFO_CATEGORY, "ID_No")),
            ],
            highlight_fill: GREEN_FILL,
            freeze_pane: "E3",
            header_rows: 2,
        }
    }
}

impl fmt::Display for ReportVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Dat,
    Html,
}

/// Everything that differs between report variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantConfig {
    pub variant: ReportVariant,
    /// Sheet / page title
    pub title: &'static str,
    pub format: SourceFormat,
    pub encoding: SourceEncoding,
    pub cleaning: CleaningRule,
    pub detail: DetailSource,
    pub strategy: ClassificationStrategy,
    /// Trailing data rows (totals) dropped after parsing
    pub drop_footer_rows: usize,
    /// One trailing character trimmed from flattened labels
    pub header_suffix_trim: Option<char>,
    pub label_separator: &'static str,
    pub serial_label: &'static str,
    /// Columns placed right after the serial column, in order
    pub derived_columns: Vec<DerivedColumn>,
    pub highlight_fill: &'static str,
    pub freeze_pane: &'static str,
    /// Header rows the renderer writes (1 = flattened labels only)
    pub header_rows: u8,
}
