//! Tabular reader for cleaned exports.
//!
//! DAT exports are tab-delimited with a two-physical-line compound header
//! (category row, field row) and arrive in an 8-bit Latin encoding. HTML
//! exports are handled in [`html`]. Both produce a [`CleanedTable`].

pub mod html;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FileError, FileResult, ParseError, ParseResult};
use crate::models::{CellValue, CleanedTable, ColumnKey, WBS_INFO_CATEGORY};

// =============================================================================
// Encoding
// =============================================================================

/// Declared text encoding of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    /// 8-bit extended Latin (decoded as windows-1252, a superset of ISO-8859-1's printable range).
    Latin1,
    Utf8,
    /// Let chardet decide.
    Detect,
}

impl SourceEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Latin1 => "iso-8859-1",
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Detect => "auto",
        }
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the named encoding.
///
/// UTF-8 is decoded strictly: invalid sequences are an encoding error, not
/// silently replaced. Latin variants cannot fail.
pub fn decode_content(bytes: &[u8], encoding: &str) -> FileResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
            encoding_rs::UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned())
                .ok_or_else(|| FileError::Encoding("content is not valid UTF-8".to_string()))
        }
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned())
        }
        "iso-8859-15" => Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()),
        other => Err(FileError::Encoding(format!("unsupported encoding '{}'", other))),
    }
}

/// Decode bytes with a declared encoding, detecting when asked to.
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> FileResult<String> {
    match encoding {
        SourceEncoding::Detect => {
            let detected = detect_encoding(bytes);
            decode_content(bytes, &detected)
                .or_else(|_| decode_content(bytes, SourceEncoding::Latin1.label()))
        }
        declared => decode_content(bytes, declared.label()),
    }
}

/// Detect the delimiter of delimited text by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read and decode a source file, checking that it exists and is a file.
pub fn read_source(path: &Path, encoding: SourceEncoding) -> FileResult<String> {
    let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
        _ => FileError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    if !meta.is_file() {
        return Err(FileError::NotAFile(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(FileError::io(path))?;
    decode(&bytes, encoding)
}

/// Read a source file as lines. An empty file is an error.
pub fn read_lines(path: &Path, encoding: SourceEncoding) -> FileResult<Vec<String>> {
    let content = read_source(path, encoding)?;
    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    if lines.is_empty() {
        return Err(FileError::Empty(path.to_path_buf()));
    }
    Ok(lines)
}

// =============================================================================
// Compound Header
// =============================================================================

/// Build a table from raw string records whose first two rows are the header.
///
/// Blank categories take `WBS_Elements_Info.` in the first column and inherit
/// the nearest category to their left elsewhere. Blank field labels become
/// `Column N`.
pub fn build_table(records: Vec<Vec<String>>) -> ParseResult<CleanedTable> {
    let mut records = records
        .into_iter()
        .filter(|r| r.iter().any(|f| !f.trim().is_empty()));

    let categories = records.next();
    let fields = records.next();
    let (categories, fields) = match (categories, fields) {
        (Some(c), Some(f)) => (c, f),
        (Some(_), None) => return Err(ParseError::MissingHeader { found: 1 }),
        _ => return Err(ParseError::MissingHeader { found: 0 }),
    };

    let width = categories.len().max(fields.len());
    if width < 2 {
        return Err(ParseError::Malformed(
            "header has a single column; the export is not delimited as expected".to_string(),
        ));
    }

    let columns = compound_keys(&categories, &fields, width);
    let mut table = CleanedTable::new(columns);
    for record in records {
        table.push_row(record.iter().map(|f| CellValue::parse(f)).collect());
    }
    Ok(table)
}

fn compound_keys(categories: &[String], fields: &[String], width: usize) -> Vec<ColumnKey> {
    let mut current = WBS_INFO_CATEGORY.to_string();
    (0..width)
        .map(|i| {
            let category = categories.get(i).map(|s| s.trim()).unwrap_or("");
            if !category.is_empty() {
                current = category.to_string();
            }
            let field = fields.get(i).map(|s| s.trim()).unwrap_or("");
            let field = if field.is_empty() {
                format!("Column {}", i + 1)
            } else {
                field.to_string()
            };
            ColumnKey::new(current.clone(), field)
        })
        .collect()
}

// =============================================================================
// DAT Reader
// =============================================================================

/// Parse cleaned tab-delimited content into a table.
pub fn parse_dat(content: &str) -> ParseResult<CleanedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    build_table(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAT: &str = "\tBudget\t\tActual\n\
                       Object\tOriginal\tCurrent\tCost\n\
                       *** Plant NL-C-MN1-001\t1,000.00\t2,000.00\t500.00-\n\
                       \n\
                       **** Site NL-C-MN1-001-01\t10\t\t\n";

    #[test]
    fn test_parse_dat_compound_header() {
        let table = parse_dat(DAT).unwrap();

        assert_eq!(table.width(), 4);
        assert_eq!(table.columns[0], ColumnKey::wbs_info("Object"));
        assert_eq!(table.columns[1], ColumnKey::new("Budget", "Original"));
        assert_eq!(table.columns[2], ColumnKey::new("Budget", "Current"));
        assert_eq!(table.columns[3], ColumnKey::new("Actual", "Cost"));
    }

    #[test]
    fn test_parse_dat_rows_skip_blank_and_pad() {
        let table = parse_dat(DAT).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], CellValue::Number(1000.0));
        assert_eq!(table.rows[0][3], CellValue::Number(-500.0));
        assert_eq!(table.rows[1][2], CellValue::Empty);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn test_blank_field_labels_are_numbered() {
        let table = parse_dat("A\tB\tC\nx\t\tz\n1\t2\t3\n").unwrap();
        assert_eq!(table.columns[1].field, "Column 2");
    }

    #[test]
    fn test_missing_second_header_row() {
        let err = parse_dat("Cat\tCat\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader { found: 1 }));

        let err = parse_dat("").unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader { found: 0 }));
    }

    #[test]
    fn test_single_column_is_malformed() {
        let err = parse_dat("just text\nmore text\nrow\n").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("WBS_element,Name\nA,B"), ',');
        assert_eq!(detect_delimiter("WBS_element\tName\tOwner"), '\t');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_latin1_decoding_keeps_accents() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode(bytes, SourceEncoding::Latin1).unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_strict_utf8_rejects_latin1_bytes() {
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9];
        let err = decode(bytes, SourceEncoding::Utf8).unwrap_err();
        assert!(matches!(err, FileError::Encoding(_)));
    }

    #[test]
    fn test_detected_encoding_decodes_ascii() {
        let decoded = decode(b"Object\tAmount", SourceEncoding::Detect).unwrap();
        assert_eq!(decoded, "Object\tAmount");
    }

    #[test]
    fn test_read_lines_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.DAT");
        assert!(matches!(
            read_lines(&missing, SourceEncoding::Latin1),
            Err(FileError::NotFound(_))
        ));

        let empty = dir.path().join("empty.DAT");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(
            read_lines(&empty, SourceEncoding::Latin1),
            Err(FileError::Empty(_))
        ));

        assert!(matches!(
            read_lines(dir.path(), SourceEncoding::Latin1),
            Err(FileError::NotAFile(_))
        ));
    }
}
