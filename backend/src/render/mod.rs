//! Plain renderers driven by a [`FormattingPlan`].
//!
//! - [`write_csv`]: flat table, one label row
//! - [`render_html`]: preview with the plan's headers, bands, highlights and currency text

use std::fmt::Write as _;
use std::path::Path;

use crate::error::{FileError, FileResult};
use crate::formatting::{format_cell, FormattingPlan};
use crate::models::CellValue;
use crate::transform::assembler::ReportTable;

// =============================================================================
// CSV
// =============================================================================

/// Write the report as CSV: flattened labels, then one line per row.
pub fn write_csv(report: &ReportTable, path: &Path) -> FileResult<()> {
    let io_err = |e: csv::Error| FileError::io(path)(e.into());

    let mut writer = csv::Writer::from_path(path).map_err(io_err)?;
    writer.write_record(report.labels()).map_err(io_err)?;
    for row in &report.rows {
        writer
            .write_record(row.cells.iter().map(CellValue::as_text))
            .map_err(io_err)?;
    }
    writer.flush().map_err(FileError::io(path))?;
    Ok(())
}

// =============================================================================
// HTML
// =============================================================================

/// Render an HTML preview table.
pub fn render_html(report: &ReportTable, plan: &FormattingPlan) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        "<table class=\"wbs-report\" style=\"font-family: '{}'; font-size: {}pt; border-collapse: collapse\">",
        plan.font.name, plan.font.size
    );
    let _ = writeln!(html, "<caption>{}</caption>", escape(&plan.sheet_name));

    html.push_str("<thead>\n");
    if plan.header_rows >= 2 {
        push_category_row(&mut html, report, &plan.header_fill);
        push_header_row(&mut html, report.columns.iter().map(|c| c.key.field.as_str()), &plan.header_fill);
    } else {
        push_header_row(&mut html, report.columns.iter().map(|c| c.label.as_str()), &plan.header_fill);
    }
    html.push_str("</thead>\n<tbody>\n");

    for (index, row) in report.rows.iter().enumerate() {
        match plan.row_fill(index, row) {
            Some(fill) => {
                let _ = write!(html, "<tr style=\"background-color: #{}\">", fill);
            }
            None => html.push_str("<tr>"),
        }
        for (col, cell) in row.cells.iter().enumerate() {
            let column = col + 1;
            if plan.is_currency_column(column) && cell.as_number().is_some() {
                let negative = cell.as_number().is_some_and(|n| n < 0.0);
                let style = if negative { " style=\"color: red\"" } else { "" };
                let _ = write!(html, "<td class=\"currency\"{}>{}</td>", style, escape(&format_cell(cell)));
            } else {
                let _ = write!(html, "<td>{}</td>", escape(&cell.as_text()));
            }
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

fn push_header_row<'a>(html: &mut String, labels: impl Iterator<Item = &'a str>, fill: &str) {
    html.push_str("<tr>");
    for label in labels {
        let _ = write!(html, "<th style=\"background-color: #{}\">{}</th>", fill, escape(label));
    }
    html.push_str("</tr>\n");
}

/// Category row with adjacent equal categories merged.
fn push_category_row(html: &mut String, report: &ReportTable, fill: &str) {
    html.push_str("<tr>");
    let mut i = 0;
    while i < report.columns.len() {
        let category = &report.columns[i].key.category;
        let span = report.columns[i..]
            .iter()
            .take_while(|c| &c.key.category == category)
            .count();
        let _ = write!(
            html,
            "<th colspan=\"{}\" style=\"background-color: #{}\">{}</th>",
            span,
            fill,
            escape(category)
        );
        i += span;
    }
    html.push_str("</tr>\n");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportVariant;
    use crate::formatting::build_plan;
    use crate::models::{Classification, ColumnKey, LevelMarker, WbsRow, WbsTable};
    use crate::transform::assembler::assemble;

    fn sample() -> (ReportTable, FormattingPlan) {
        let config = ReportVariant::BudgetReport.config();
        let table = WbsTable {
            columns: vec![ColumnKey::new("Budget", "Current"), ColumnKey::new("Budget", "Spent")],
            rows: vec![
                WbsRow {
                    level: Some(LevelMarker::One),
                    description: "Plant & Yard".into(),
                    id: Some("NL-C-MN1-001".into()),
                    cells: vec![CellValue::Number(150000.0), CellValue::Number(-1234.5)],
                },
                WbsRow {
                    level: Some(LevelMarker::Two),
                    description: "Boiler".into(),
                    id: Some("NL-C-MN1-001-01".into()),
                    cells: vec![CellValue::Number(10.0), CellValue::Empty],
                },
            ],
            summary_export: false,
        };
        let classification = Classification {
            summary: vec!["NL-C-MN1-001".into()],
            transaction: vec!["NL-C-MN1-001-01".into()],
        };
        let report = assemble(table, &config);
        let plan = build_plan(&report, &classification, &config);
        (report, plan)
    }

    #[test]
    fn test_write_csv() {
        let (report, _) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write_csv(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Sl No.,WBS_Elements_Info. - Level,WBS_Elements_Info. - Description,WBS_Elements_Info. - ID_No,Budget - Current,Budget - Spent"
        );
        assert_eq!(lines.next().unwrap(), "1,*,Plant & Yard,NL-C-MN1-001,150000,-1234.5");
        assert_eq!(lines.next().unwrap(), "2,**,Boiler,NL-C-MN1-001-01,10,");
    }

    #[test]
    fn test_render_html_two_header_rows() {
        let (report, plan) = sample();
        let html = render_html(&report, &plan);

        assert!(html.contains("colspan=\"3\""));
        assert!(html.contains(">Budget</th>"));
        assert!(html.contains(">ID_No</th>"));
        assert!(html.contains("Plant &amp; Yard"));
    }

    #[test]
    fn test_render_html_highlight_and_currency() {
        let (report, plan) = sample();
        let html = render_html(&report, &plan);

        assert!(html.contains("<tr style=\"background-color: #90EE90\">"));
        assert!(html.contains("₹ 1,50,000.00"));
        assert!(html.contains("style=\"color: red\">₹ -1,234.50"));
        // Serial column is never currency
        assert!(html.contains("<td>1</td>"));
    }
}
