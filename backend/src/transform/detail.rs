//! WBS detail parser.
//!
//! Splits the compound object text of a row (`"*** Construction NL-C-MN1-001"`)
//! into a level marker, a description and an identifier, then lifts every
//! row of a [`CleanedTable`] into a [`WbsRow`].

use serde::{Deserialize, Serialize};

use crate::error::{DataValidationError, ValidationResult};
use crate::models::{CellValue, CleanedTable, LevelMarker, WbsRow, WbsTable};
use crate::validation::find_identifier;

// =============================================================================
// Layout
// =============================================================================

/// Token order inside the object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldOrder {
    /// `Level Description... Identifier`
    LevelDescriptionId,
    /// `Level Identifier Description...`
    LevelIdDescription,
}

/// How the identifier token is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdLocator {
    /// First identifier anywhere in the field, even inside punctuation.
    /// Only the identifier is cut; surrounding text stays in the description.
    Pattern,
    /// Taken as-is from its position in [`FieldOrder`].
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailLayout {
    pub order: FieldOrder,
    pub locator: IdLocator,
    /// Tokens dropped before the description is built.
    pub noise_tokens: Vec<String>,
}

/// Where a variant's level/description/identifier come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DetailSource {
    /// One compound text column, located by its field label.
    ObjectField { field: String, layout: DetailLayout },
    /// Separate identifier and description columns, by position.
    Columns {
        id_column: usize,
        description_column: usize,
    },
}

/// The three derived parts of an object field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbsDetail {
    pub level: Option<LevelMarker>,
    pub description: String,
    pub id: Option<String>,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse one object field.
///
/// A leading token outside the marker vocabulary is kept as the start of the
/// description. Fields with fewer than two tokens are returned as plain
/// description with no level and no identifier.
pub fn parse_detail(text: &str, layout: &DetailLayout) -> WbsDetail {
    if text.split_whitespace().nth(1).is_none() {
        return WbsDetail {
            level: None,
            description: text.trim().to_string(),
            id: None,
        };
    }

    let (id, rest) = split_identifier(text, layout);
    let mut tokens: Vec<&str> = rest.split_whitespace().collect();
    tokens.retain(|t| !layout.noise_tokens.iter().any(|n| n == t));

    let level = tokens.first().and_then(|t| LevelMarker::parse(t));
    if level.is_some() {
        tokens.remove(0);
    }

    WbsDetail {
        level,
        description: tokens.join(" "),
        id,
    }
}

/// Take the identifier out of `text`, returning it and what is left.
fn split_identifier(text: &str, layout: &DetailLayout) -> (Option<String>, String) {
    if layout.locator == IdLocator::Pattern {
        return match find_identifier(text) {
            Some(span) => (
                Some(text[span.clone()].to_string()),
                format!("{}{}", &text[..span.start], &text[span.end..]),
            ),
            None => (None, text.to_string()),
        };
    }

    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let at = match layout.order {
        FieldOrder::LevelDescriptionId => tokens.len() - 1,
        FieldOrder::LevelIdDescription => 1,
    };
    let id = tokens.remove(at).to_string();
    (Some(id), tokens.join(" "))
}

/// Lift every row of `table` into a [`WbsRow`], consuming the detail column(s).
pub fn extract_wbs_rows(
    mut table: CleanedTable,
    source: &DetailSource,
    summary_export: bool,
) -> ValidationResult<WbsTable> {
    let (consumed, details): (Vec<usize>, Vec<WbsDetail>) = match source {
        DetailSource::ObjectField { field, layout } => {
            let idx = table
                .find_field(field)
                .ok_or_else(|| DataValidationError::MissingColumn(field.clone()))?;
            let details = table
                .rows
                .iter()
                .map(|cells| parse_detail(&text_at(cells, idx), layout))
                .collect();
            (vec![idx], details)
        }
        DetailSource::Columns {
            id_column,
            description_column,
        } => {
            let needed = (*id_column).max(*description_column);
            if needed >= table.width() {
                return Err(DataValidationError::MissingColumn(format!(
                    "column {}",
                    needed + 1
                )));
            }
            let details = table
                .rows
                .iter()
                .map(|cells| {
                    let id = text_at(cells, *id_column);
                    WbsDetail {
                        level: None,
                        description: text_at(cells, *description_column),
                        id: (!id.is_empty()).then_some(id),
                    }
                })
                .collect();
            (vec![*id_column, *description_column], details)
        }
    };

    table.remove_columns(&consumed);

    let rows = table
        .rows
        .into_iter()
        .zip(details)
        .map(|(cells, detail)| WbsRow {
            level: detail.level,
            description: detail.description,
            id: detail.id,
            cells,
        })
        .collect();

    Ok(WbsTable {
        columns: table.columns,
        rows,
        summary_export,
    })
}

fn text_at(cells: &[CellValue], i: usize) -> String {
    cells
        .get(i)
        .map(|c| c.as_text().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnKey;

    fn budget_layout() -> DetailLayout {
        DetailLayout {
            order: FieldOrder::LevelDescriptionId,
            locator: IdLocator::Pattern,
            noise_tokens: vec!["PRJ".into()],
        }
    }

    fn updates_layout() -> DetailLayout {
        DetailLayout {
            order: FieldOrder::LevelIdDescription,
            locator: IdLocator::Positional,
            noise_tokens: vec![],
        }
    }

    #[test]
    fn test_marker_description_identifier() {
        let d = parse_detail("*** Construction of Plant NL-C-MN1-001", &budget_layout());
        assert_eq!(d.level, Some(LevelMarker::Three));
        assert_eq!(d.description, "Construction of Plant");
        assert_eq!(d.id.as_deref(), Some("NL-C-MN1-001"));
    }

    #[test]
    fn test_non_marker_leading_token_folds_into_description() {
        let d = parse_detail("Construction of Plant NL-C-MN1-001", &budget_layout());
        assert_eq!(d.level, None);
        assert_eq!(d.description, "Construction of Plant");
        assert_eq!(d.id.as_deref(), Some("NL-C-MN1-001"));
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let d = parse_detail("  **   Boiler    feed\tpump   NL-C-MN1-001-02 ", &budget_layout());
        assert_eq!(d.level, Some(LevelMarker::Two));
        assert_eq!(d.description, "Boiler feed pump");
    }

    #[test]
    fn test_noise_token_removed() {
        let d = parse_detail("* PRJ NL-C-MN1-001 Mining Project", &budget_layout());
        assert_eq!(d.level, Some(LevelMarker::One));
        assert_eq!(d.description, "Mining Project");
        assert_eq!(d.id.as_deref(), Some("NL-C-MN1-001"));
    }

    #[test]
    fn test_pattern_without_match_has_no_identifier() {
        let d = parse_detail("4* Overheads pool", &budget_layout());
        assert_eq!(d.level, Some(LevelMarker::Four));
        assert_eq!(d.description, "Overheads pool");
        assert_eq!(d.id, None);
    }

    #[test]
    fn test_identifier_inside_parentheses() {
        let d = parse_detail("*** Plant (NL-C-MN1-001)", &budget_layout());
        assert_eq!(d.level, Some(LevelMarker::Three));
        assert_eq!(d.id.as_deref(), Some("NL-C-MN1-001"));
        assert_eq!(d.description, "Plant ()");
    }

    #[test]
    fn test_identifier_followed_by_comma() {
        let d = parse_detail("*** Plant NL-C-MN1-001,", &budget_layout());
        assert_eq!(d.id.as_deref(), Some("NL-C-MN1-001"));
        assert_eq!(d.description, "Plant ,");
    }

    #[test]
    fn test_identifier_glued_to_hyphen_is_ignored() {
        let d = parse_detail("** Spare X-NL-C-MN1-001", &budget_layout());
        assert_eq!(d.id, None);
        assert_eq!(d.description, "Spare X-NL-C-MN1-001");
    }

    #[test]
    fn test_single_token_field() {
        let d = parse_detail("  Total  ", &budget_layout());
        assert_eq!(d.level, None);
        assert_eq!(d.description, "Total");
        assert_eq!(d.id, None);
    }

    #[test]
    fn test_level_identifier_description_order() {
        let d = parse_detail("** NL-C-MN1-001-01 Coal handling plant", &updates_layout());
        assert_eq!(d.level, Some(LevelMarker::Two));
        assert_eq!(d.id.as_deref(), Some("NL-C-MN1-001-01"));
        assert_eq!(d.description, "Coal handling plant");
    }

    #[test]
    fn test_positional_takes_token_as_is() {
        let layout = DetailLayout {
            order: FieldOrder::LevelDescriptionId,
            locator: IdLocator::Positional,
            noise_tokens: vec![],
        };
        let d = parse_detail("* Misc item X-99", &layout);
        assert_eq!(d.id.as_deref(), Some("X-99"));
        assert_eq!(d.description, "Misc item");
    }

    #[test]
    fn test_extract_rows_from_object_field() {
        let mut table = CleanedTable::new(vec![
            ColumnKey::wbs_info("Object"),
            ColumnKey::new("Budget", "Current"),
        ]);
        table.push_row(vec![
            CellValue::Text("*** Plant NL-C-MN1-001".into()),
            CellValue::Number(10.0),
        ]);
        table.push_row(vec![CellValue::Empty, CellValue::Number(5.0)]);

        let source = DetailSource::ObjectField {
            field: "Object".into(),
            layout: budget_layout(),
        };
        let wbs = extract_wbs_rows(table, &source, false).unwrap();

        assert_eq!(wbs.columns, vec![ColumnKey::new("Budget", "Current")]);
        assert_eq!(wbs.rows[0].id.as_deref(), Some("NL-C-MN1-001"));
        assert_eq!(wbs.rows[0].cells, vec![CellValue::Number(10.0)]);
        assert_eq!(wbs.rows[1].id, None);
        assert_eq!(wbs.rows[1].description, "");
    }

    #[test]
    fn test_extract_rows_missing_object_column() {
        let table = CleanedTable::new(vec![ColumnKey::new("Budget", "Current")]);
        let source = DetailSource::ObjectField {
            field: "Object".into(),
            layout: budget_layout(),
        };
        let err = extract_wbs_rows(table, &source, false).unwrap_err();
        assert!(matches!(err, DataValidationError::MissingColumn(f) if f == "Object"));
    }

    #[test]
    fn test_extract_rows_from_columns() {
        let mut table = CleanedTable::new(vec![
            ColumnKey::new("WBS", "Element"),
            ColumnKey::new("WBS", "Name"),
            ColumnKey::new("Budget", "Plan"),
        ]);
        table.push_row(vec![
            CellValue::Text(" NL-C-MN1-001 ".into()),
            CellValue::Text("Main plant".into()),
            CellValue::Number(1.0),
        ]);

        let source = DetailSource::Columns {
            id_column: 0,
            description_column: 1,
        };
        let wbs = extract_wbs_rows(table, &source, false).unwrap();

        assert_eq!(wbs.columns.len(), 1);
        assert_eq!(wbs.rows[0].id.as_deref(), Some("NL-C-MN1-001"));
        assert_eq!(wbs.rows[0].description, "Main plant");
        assert_eq!(wbs.rows[0].level, None);
    }
}
