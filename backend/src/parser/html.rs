//! HTML table reader for variance exports.
//!
//! The export is an HTML document holding one table whose first two rows
//! form the compound header. Cells spanning several columns are repeated
//! across the span so every row lines up with the header.

use scraper::{ElementRef, Html, Selector};

use crate::error::{ParseError, ParseResult};
use crate::models::CleanedTable;

use super::build_table;

/// Parse the first table of an HTML document.
pub fn parse_html(content: &str) -> ParseResult<CleanedTable> {
    let document = Html::parse_document(content);
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or(ParseError::NoTable)?;

    let records: Vec<Vec<String>> = table
        .select(&row_selector)
        .map(|row| expand_row(row, &cell_selector))
        .collect();

    build_table(records)
}

fn selector(css: &str) -> ParseResult<Selector> {
    Selector::parse(css).map_err(|e| ParseError::Malformed(format!("selector '{}': {:?}", css, e)))
}

fn expand_row(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in row.select(cell_selector) {
        let text = cell_text(cell);
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        cells.extend(std::iter::repeat(text).take(span));
    }
    cells
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
