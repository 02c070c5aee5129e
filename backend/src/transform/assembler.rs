//! Tabular assembler: final column order, serial numbers and flat labels.
//!
//! Output layout is `serial | derived columns | remaining source columns`.
//! Serials are assigned after empty rows are dropped, so they run 1..=n
//! without gaps. The formatting plan addresses rows and columns by these
//! positions.

use serde::{Deserialize, Serialize};

use crate::config::VariantConfig;
use crate::models::{CellValue, ColumnKey, WbsRow, WbsTable};

// =============================================================================
// Derived Columns
// =============================================================================

/// A value lifted out of the object field (or detail columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedField {
    Level,
    Description,
    Id,
}

/// A derived field and the column key it is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub field: DerivedField,
    pub key: ColumnKey,
}

impl DerivedColumn {
    pub fn new(field: DerivedField, key: ColumnKey) -> Self {
        Self { field, key }
    }

    fn value(&self, row: &WbsRow) -> CellValue {
        let text = match self.field {
            DerivedField::Level => row.level_label().to_string(),
            DerivedField::Description => row.description.clone(),
            DerivedField::Id => row.trimmed_id().unwrap_or("").to_string(),
        };
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text)
        }
    }
}

// =============================================================================
// Report Table
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportColumn {
    /// Compound key, for two-row headers
    pub key: ColumnKey,
    /// Flattened single-row label
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// 1-based, gapless
    pub serial: usize,
    pub id: Option<String>,
    /// One cell per report column, serial first
    pub cells: Vec<CellValue>,
}

/// The assembled report, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTable {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
    /// 0-based position of the identifier column, if the layout has one
    pub id_column: Option<usize>,
    /// 0-based position of the first source (non-derived) column
    pub data_start: usize,
    /// Rows removed because every field was empty
    pub dropped_rows: usize,
}

impl ReportTable {
    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Assemble a classified and mapped table into the report layout.
pub fn assemble(table: WbsTable, config: &VariantConfig) -> ReportTable {
    let flatten = |key: &ColumnKey| {
        let label = key.label_with(config.label_separator);
        match config.header_suffix_trim {
            Some(c) => trim_suffix(&label, c),
            None => label,
        }
    };

    let serial_key = ColumnKey::new("", config.serial_label);
    let mut columns = vec![ReportColumn {
        label: config.serial_label.to_string(),
        key: serial_key,
    }];
    columns.extend(config.derived_columns.iter().map(|d| ReportColumn {
        label: flatten(&d.key),
        key: d.key.clone(),
    }));
    let data_start = columns.len();
    columns.extend(table.columns.iter().map(|key| ReportColumn {
        label: flatten(key),
        key: key.clone(),
    }));

    let id_column = config
        .derived_columns
        .iter()
        .position(|d| d.field == DerivedField::Id)
        .map(|i| i + 1);

    let before = table.rows.len();
    let rows: Vec<ReportRow> = table
        .rows
        .into_iter()
        .filter(|row| !is_fully_empty(row))
        .enumerate()
        .map(|(i, row)| {
            let serial = i + 1;
            let mut cells = Vec::with_capacity(data_start + row.cells.len());
            cells.push(CellValue::Number(serial as f64));
            cells.extend(config.derived_columns.iter().map(|d| d.value(&row)));
            cells.extend(row.cells.iter().cloned());
            ReportRow {
                serial,
                id: row.trimmed_id().map(str::to_string),
                cells,
            }
        })
        .collect();

    ReportTable {
        dropped_rows: before - rows.len(),
        columns,
        rows,
        id_column,
        data_start,
    }
}

fn is_fully_empty(row: &WbsRow) -> bool {
    row.level.is_none()
        && row.description.trim().is_empty()
        && row.trimmed_id().is_none()
        && row.cells.iter().all(CellValue::is_empty)
}

/// Drop one trailing `suffix` unless it continues a number (`"Plan1"` -> `"Plan"`, `"FY 2021"` kept).
fn trim_suffix(label: &str, suffix: char) -> String {
    match label.strip_suffix(suffix) {
        Some(rest) if !rest.ends_with(|c: char| c.is_ascii_digit()) && !rest.trim().is_empty() => {
            rest.trim_end().to_string()
        }
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportVariant;
    use crate::models::LevelMarker;

    fn wbs_row(level: Option<LevelMarker>, description: &str, id: Option<&str>, cells: Vec<CellValue>) -> WbsRow {
        WbsRow {
            level,
            description: description.to_string(),
            id: id.map(String::from),
            cells,
        }
    }

    fn dat_table() -> WbsTable {
        WbsTable {
            columns: vec![
                ColumnKey::new("Budget", "Original"),
                ColumnKey::new("Budget", "Current"),
            ],
            rows: vec![
                wbs_row(
                    Some(LevelMarker::One),
                    "Main Plant",
                    Some("NL-C-MN1-001"),
                    vec![CellValue::Number(100.0), CellValue::Number(200.0)],
                ),
                wbs_row(None, "", None, vec![CellValue::Empty, CellValue::Empty]),
                wbs_row(
                    Some(LevelMarker::Two),
                    "Boiler",
                    Some("NL-C-MN1-001-01"),
                    vec![CellValue::Number(50.0), CellValue::Empty],
                ),
                wbs_row(None, "Unassigned", None, vec![CellValue::Number(1.0), CellValue::Empty]),
            ],
            summary_export: false,
        }
    }

    #[test]
    fn test_dat_layout_and_labels() {
        let report = assemble(dat_table(), &ReportVariant::BudgetReport.config());

        assert_eq!(
            report.labels(),
            vec![
                "Sl No.",
                "WBS_Elements_Info. - Level",
                "WBS_Elements_Info. - Description",
                "WBS_Elements_Info. - ID_No",
                "Budget - Original",
                "Budget - Current",
            ]
        );
        assert_eq!(report.id_column, Some(3));
        assert_eq!(report.data_start, 4);
    }

    #[test]
    fn test_serials_are_gapless_after_drop() {
        let report = assemble(dat_table(), &ReportVariant::BudgetReport.config());

        assert_eq!(report.dropped_rows, 1);
        let serials: Vec<usize> = report.rows.iter().map(|r| r.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);
        assert_eq!(report.rows[1].cells[0], CellValue::Number(2.0));
        assert_eq!(report.rows[1].id.as_deref(), Some("NL-C-MN1-001-01"));
    }

    #[test]
    fn test_row_cells_follow_columns() {
        let report = assemble(dat_table(), &ReportVariant::BudgetReport.config());
        let first = &report.rows[0];

        assert_eq!(first.cells.len(), report.width());
        assert_eq!(first.cells[1], CellValue::Text("*".into()));
        assert_eq!(first.cells[2], CellValue::Text("Main Plant".into()));
        assert_eq!(first.cells[3], CellValue::Text("NL-C-MN1-001".into()));
        assert_eq!(first.cells[5], CellValue::Number(200.0));

        // Row without level or identifier keeps blanks in the derived columns
        let last = &report.rows[2];
        assert_eq!(last.cells[1], CellValue::Empty);
        assert_eq!(last.cells[3], CellValue::Empty);
    }

    #[test]
    fn test_html_layout_trims_trailing_one() {
        let table = WbsTable {
            columns: vec![
                ColumnKey::new("Budget", "Plan1"),
                ColumnKey::new("Budget", "FY 2021"),
            ],
            rows: vec![wbs_row(
                None,
                "Main Plant",
                Some("NL-C-MN1-001"),
                vec![CellValue::Number(1.0), CellValue::Number(2.0)],
            )],
            summary_export: false,
        };
        let report = assemble(table, &ReportVariant::BudgetVariance.config());

        assert_eq!(
            report.labels(),
            vec!["SI_NO", "WBS_element", "Description", "Budget Plan", "Budget FY 2021"]
        );
        assert_eq!(report.id_column, Some(1));
        assert_eq!(report.data_start, 3);
    }

    #[test]
    fn test_trim_suffix_rules() {
        assert_eq!(trim_suffix("Actual1", '1'), "Actual");
        assert_eq!(trim_suffix("Period 11", '1'), "Period 11");
        assert_eq!(trim_suffix("1", '1'), "1");
        assert_eq!(trim_suffix("Variance", '1'), "Variance");
    }
}
