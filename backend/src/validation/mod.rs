//! Identifier grammar and table-shape checks.
//!
//! # Identifier grammar
//!
//! ```text
//! NL-C-MN1-001-01
//! ^^ ^ ^^^ ^^^ ^^
//! |  | |   |   child segment(s), zero or more
//! |  | |   serial (3 digits)
//! |  | plant (3 letters or digits)
//! |  project type (1 letter)
//! company (2 letters)
//! ```
//!
//! Shape problems in the identifier column are reported, not fatal: rows
//! with odd identifiers still flow through the pipeline.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DataValidationError, ValidationResult};
use crate::models::{CleanedTable, WbsTable};

/// Full-string WBS identifier grammar (ASCII digits only).
pub static WBS_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{2}-[A-Z]-[A-Z0-9]{3}-[0-9]{3}(?:-[0-9]{2})*$")
        .expect("identifier grammar is a valid regex")
});

/// The same grammar inside free text. An identifier must not touch another
/// letter, digit or hyphen, so `X-NL-C-MN1-001` and `NL-C-MN1-001-1` do not match.
static WBS_ID_SEARCH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9-])([A-Z]{2}-[A-Z]-[A-Z0-9]{3}-[0-9]{3}(?:-[0-9]{2})*)(?:$|[^A-Za-z0-9-])")
        .expect("identifier search is a valid regex")
});

/// Byte range of the first identifier in `text`, wherever it sits.
pub fn find_identifier(text: &str) -> Option<Range<usize>> {
    WBS_ID_SEARCH_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
}

/// True when `id` follows the identifier grammar exactly.
pub fn is_valid_identifier(id: &str) -> bool {
    WBS_ID_REGEX.is_match(id)
}

/// Check every non-blank identifier against the grammar.
///
/// # Returns
/// * `Ok(())` if every identifier is well formed
/// * `Err(issues)` with one [`DataValidationError::MalformedIdentifier`] per
///   offending row (1-based data row numbers)
pub fn validate_identifiers(table: &WbsTable) -> Result<(), Vec<DataValidationError>> {
    let issues: Vec<DataValidationError> = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let id = row.trimmed_id()?;
            (!is_valid_identifier(id)).then(|| DataValidationError::MalformedIdentifier {
                row: i + 1,
                value: id.to_string(),
            })
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Check that required fields exist and that there are enough data rows.
pub fn validate_table(
    table: &CleanedTable,
    required_fields: &[&str],
    min_rows: usize,
) -> ValidationResult<()> {
    for field in required_fields {
        if table.find_field(field).is_none() {
            return Err(DataValidationError::MissingColumn(field.to_string()));
        }
    }
    if table.len() < min_rows {
        return Err(DataValidationError::InsufficientRows {
            expected: min_rows,
            found: table.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, ColumnKey, WbsRow};

    fn row(id: Option<&str>) -> WbsRow {
        WbsRow {
            level: None,
            description: String::new(),
            id: id.map(String::from),
            cells: vec![],
        }
    }

    #[test]
    fn test_identifier_grammar() {
        assert!(is_valid_identifier("NL-C-MN1-001"));
        assert!(is_valid_identifier("NL-C-MNP-001-01"));
        assert!(is_valid_identifier("AB-C-DEF-001-01-02"));

        assert!(!is_valid_identifier("NL-C-MN1-01"));
        assert!(!is_valid_identifier("nl-c-mn1-001"));
        assert!(!is_valid_identifier("NL-C-MN1-001-1"));
        assert!(!is_valid_identifier(" NL-C-MN1-001"));
        assert!(!is_valid_identifier("NL-C-MN1-001-01X"));
    }

    #[test]
    fn test_find_identifier_in_text() {
        let found = |text: &'static str| find_identifier(text).map(|r| &text[r]);

        assert_eq!(found("*** Plant (NL-C-MN1-001)"), Some("NL-C-MN1-001"));
        assert_eq!(found("*** Plant NL-C-MN1-001,"), Some("NL-C-MN1-001"));
        assert_eq!(found("NL-C-MN1-001-01/Coal"), Some("NL-C-MN1-001-01"));
        assert_eq!(found("ref:AB-C-DEF-001-01-02"), Some("AB-C-DEF-001-01-02"));

        assert_eq!(found("X-NL-C-MN1-001 Plant"), None);
        assert_eq!(found("Plant NL-C-MN1-001-1"), None);
        assert_eq!(found("Plant NL-C-MN1-0012"), None);
        assert_eq!(found("Overheads pool"), None);
    }

    #[test]
    fn test_validate_identifiers_reports_rows() {
        let table = WbsTable {
            columns: vec![],
            rows: vec![row(Some("NL-C-MN1-001")), row(None), row(Some("garbage"))],
            summary_export: false,
        };

        let issues = validate_identifiers(&table).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            &issues[0],
            DataValidationError::MalformedIdentifier { row: 3, value } if value == "garbage"
        ));
    }

    #[test]
    fn test_validate_table_shape() {
        let mut table = CleanedTable::new(vec![
            ColumnKey::wbs_info("Object"),
            ColumnKey::new("Budget", "Current"),
        ]);
        assert!(matches!(
            validate_table(&table, &["Object"], 1),
            Err(DataValidationError::InsufficientRows { expected: 1, found: 0 })
        ));

        table.push_row(vec![CellValue::Text("* X NL-C-MN1-001".into())]);
        assert!(validate_table(&table, &["Object"], 1).is_ok());
        assert!(matches!(
            validate_table(&table, &["WBS element"], 0),
            Err(DataValidationError::MissingColumn(_))
        ));
    }
}
