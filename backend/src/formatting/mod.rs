//! Formatting rule engine.
//!
//! Produces a [`FormattingPlan`]: a declarative description of how the
//! assembled report should look. Renderers consume the plan; nothing here
//! touches raw export text. Column and row numbers are 1-based sheet
//! positions.

pub mod currency;

use serde::Serialize;

use crate::config::VariantConfig;
use crate::models::Classification;
use crate::transform::assembler::{ReportRow, ReportTable};

pub use currency::{format_cell, format_indian_currency, CURRENCY_FORMAT};

pub const HEADER_FILL: &str = "FFFF00";
pub const BAND_FILLS: [&str; 2] = ["87CEEB", "FFFFFF"];
pub const FONT_NAME: &str = "Bookman Old Style";
pub const FONT_SIZE: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontSpec {
    pub name: String,
    pub size: u8,
}

/// Inclusive 1-based column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnRange {
    pub first: usize,
    pub last: usize,
}

impl ColumnRange {
    pub fn contains(&self, column: usize) -> bool {
        (self.first..=self.last).contains(&column)
    }
}

/// Fill every cell of rows whose identifier is in `ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRule {
    /// Column holding the identifier
    pub id_column: usize,
    pub ids: Vec<String>,
    pub fill: String,
}

impl HighlightRule {
    pub fn matches(&self, id: &str) -> bool {
        let id = id.trim();
        self.ids.iter().any(|i| i == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingPlan {
    pub sheet_name: String,
    /// Header rows written above the data (1 or 2)
    pub header_rows: u8,
    pub header_fill: String,
    /// Cell anchoring frozen panes
    pub freeze_pane: String,
    /// First row receiving alternating band fills
    pub band_start_row: usize,
    pub band_fills: Vec<String>,
    /// Columns formatted as currency (numeric cells only); None when the report has no data columns
    pub currency_columns: Option<ColumnRange>,
    pub currency_format: String,
    pub font: FontSpec,
    pub highlight: Option<HighlightRule>,
}

impl FormattingPlan {
    /// Sheet row of a data row (0-based index into the report rows).
    pub fn sheet_row(&self, index: usize) -> usize {
        self.header_rows as usize + index + 1
    }

    pub fn is_highlighted(&self, row: &ReportRow) -> bool {
        match (&self.highlight, &row.id) {
            (Some(rule), Some(id)) => rule.matches(id),
            _ => false,
        }
    }

    /// Fill for a data row: highlight wins over banding.
    pub fn row_fill(&self, index: usize, row: &ReportRow) -> Option<&str> {
        if let Some(rule) = self.highlight.as_ref().filter(|_| self.is_highlighted(row)) {
            return Some(rule.fill.as_str());
        }
        let sheet_row = self.sheet_row(index);
        if sheet_row < self.band_start_row || self.band_fills.is_empty() {
            return None;
        }
        let band = (sheet_row - self.band_start_row) % self.band_fills.len();
        Some(self.band_fills[band].as_str())
    }

    pub fn is_currency_column(&self, column: usize) -> bool {
        self.currency_columns.is_some_and(|r| r.contains(column))
    }
}

/// Derive the plan from the assembled report and its classification.
pub fn build_plan(
    report: &ReportTable,
    classification: &Classification,
    config: &VariantConfig,
) -> FormattingPlan {
    let currency_columns = (report.width() > report.data_start).then(|| ColumnRange {
        first: report.data_start + 1,
        last: report.width(),
    });

    let highlight = report.id_column.map(|col| HighlightRule {
        id_column: col + 1,
        ids: classification.summary.clone(),
        fill: config.highlight_fill.to_string(),
    });

    FormattingPlan {
        sheet_name: config.title.to_string(),
        header_rows: config.header_rows,
        header_fill: HEADER_FILL.to_string(),
        freeze_pane: config.freeze_pane.to_string(),
        band_start_row: config.header_rows as usize + 1,
        band_fills: BAND_FILLS.iter().map(|f| f.to_string()).collect(),
        currency_columns,
        currency_format: CURRENCY_FORMAT.to_string(),
        font: FontSpec {
            name: FONT_NAME.to_string(),
            size: FONT_SIZE,
        },
        highlight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportVariant;
    use crate::models::{CellValue, ColumnKey, WbsRow, WbsTable};
    use crate::transform::assembler::assemble;

    fn report(variant: ReportVariant) -> (ReportTable, VariantConfig) {
        let config = variant.config();
        let table = WbsTable {
            columns: vec![ColumnKey::new("Budget", "Current"), ColumnKey::new("Actual", "Cost")],
            rows: ["NL-C-MN1-001", "NL-C-MN1-001-01", "NL-C-MN1-002"]
                .iter()
                .map(|id| WbsRow {
                    level: None,
                    description: "x".into(),
                    id: Some(id.to_string()),
                    cells: vec![CellValue::Number(1.0), CellValue::Number(2.0)],
                })
                .collect(),
            summary_export: false,
        };
        (assemble(table, &config), config)
    }

    fn classification() -> Classification {
        Classification {
            summary: vec!["NL-C-MN1-001".into()],
            transaction: vec!["NL-C-MN1-001-01".into(), "NL-C-MN1-002".into()],
        }
    }

    #[test]
    fn test_dat_plan() {
        let (report, config) = report(ReportVariant::PlanVariance);
        let plan = build_plan(&report, &classification(), &config);

        assert_eq!(plan.freeze_pane, "E3");
        assert_eq!(plan.header_rows, 2);
        assert_eq!(plan.currency_columns, Some(ColumnRange { first: 5, last: 6 }));
        let highlight = plan.highlight.as_ref().unwrap();
        assert_eq!(highlight.id_column, 4);
        assert_eq!(highlight.fill, "90EE90");
        assert_eq!(highlight.ids, vec!["NL-C-MN1-001"]);
    }

    #[test]
    fn test_html_plan() {
        let (report, config) = report(ReportVariant::BudgetVariance);
        let plan = build_plan(&report, &classification(), &config);

        assert_eq!(plan.freeze_pane, "D3");
        assert_eq!(plan.header_rows, 1);
        assert_eq!(plan.currency_columns, Some(ColumnRange { first: 4, last: 5 }));
        let highlight = plan.highlight.as_ref().unwrap();
        assert_eq!(highlight.id_column, 2);
        assert_eq!(highlight.fill, "FFA500");
        assert_eq!(plan.sheet_name, "Budget Variance");
    }

    #[test]
    fn test_row_fills() {
        let (report, config) = report(ReportVariant::BudgetUpdates);
        let plan = build_plan(&report, &classification(), &config);

        assert!(plan.is_highlighted(&report.rows[0]));
        assert_eq!(plan.row_fill(0, &report.rows[0]), Some("90EE90"));
        // Bands alternate from the first data row (sheet row 3)
        assert_eq!(plan.sheet_row(1), 4);
        assert_eq!(plan.row_fill(1, &report.rows[1]), Some("FFFFFF"));
        assert_eq!(plan.row_fill(2, &report.rows[2]), Some("87CEEB"));
    }

    #[test]
    fn test_currency_columns_exclude_derived() {
        let (report, config) = report(ReportVariant::BudgetReport);
        let plan = build_plan(&report, &classification(), &config);

        assert!(!plan.is_currency_column(1));
        assert!(!plan.is_currency_column(4));
        assert!(plan.is_currency_column(5));
    }

    #[test]
    fn test_plan_serializes() {
        let (report, config) = report(ReportVariant::BudgetReport);
        let plan = build_plan(&report, &classification(), &config);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["freezePane"], "E3");
        assert_eq!(json["highlight"]["idColumn"], 4);
    }
}
