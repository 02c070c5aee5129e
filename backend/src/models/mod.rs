//! Domain models for the WBS report pipeline.
//!
//! - [`ColumnKey`] - two-part `(category, field)` column key from the compound header
//! - [`CellValue`] - a raw cell, numeric or text
//! - [`CleanedTable`] - rows keyed by the shared column set
//! - [`LevelMarker`] - hierarchy depth marker from the object field
//! - [`WbsRow`] / [`WbsTable`] - rows with the derived level, description and identifier
//! - [`Classification`] - summary / transaction partition of identifiers

use serde::{Deserialize, Serialize};

/// Category given to blank first-column categories and to the derived columns.
pub const WBS_INFO_CATEGORY: &str = "WBS_Elements_Info.";

/// Separator used when flattening a compound column key.
pub const LABEL_SEPARATOR: &str = " - ";

// =============================================================================
// Column Keys
// =============================================================================

/// Two-part column key: category row label, field row label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub category: String,
    pub field: String,
}

impl ColumnKey {
    pub fn new(category: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            field: field.into(),
        }
    }

    /// Key under the fixed WBS info category.
    pub fn wbs_info(field: impl Into<String>) -> Self {
        Self::new(WBS_INFO_CATEGORY, field)
    }

    /// Flattened display label, e.g. `"Budget - Current"`.
    pub fn label(&self) -> String {
        self.label_with(LABEL_SEPARATOR)
    }

    /// Flattened label with a custom separator; a blank category yields the field alone.
    pub fn label_with(&self, separator: &str) -> String {
        if self.category.trim().is_empty() {
            return self.field.trim().to_string();
        }
        format!("{}{}{}", self.category, separator, self.field)
            .trim()
            .to_string()
    }
}

// =============================================================================
// Cell Values
// =============================================================================

/// A raw cell value as read from an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Interpret raw export text.
    ///
    /// Accepts thousands separators and trailing-minus negatives (`1,234.50-`).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match parse_number(trimmed) {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Plain text rendering (integral numbers without a fraction).
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let looks_numeric = text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'));
    if !looks_numeric {
        return None;
    }

    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    match cleaned.strip_suffix('-') {
        Some(body) if !body.starts_with('-') => body.parse::<f64>().ok().map(|n| -n),
        Some(_) => None,
        None => cleaned.parse::<f64>().ok(),
    }
}

// =============================================================================
// Cleaned Table
// =============================================================================

/// Rows sharing one ordered column-key set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedTable {
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<Vec<CellValue>>,
}

impl CleanedTable {
    pub fn new(columns: Vec<ColumnKey>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padded with empty cells or truncated to the column count.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(cells);
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column whose field label matches, ignoring surrounding space.
    pub fn find_field(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field.trim() == field)
    }

    /// Remove columns by index, keeping every row aligned.
    pub fn remove_columns(&mut self, indices: &[usize]) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| !indices.contains(&i))
            .collect();

        let mut i = 0;
        self.columns.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(false);
                i += 1;
                k
            });
        }
    }
}

// =============================================================================
// WBS Rows
// =============================================================================

/// Hierarchy depth marker leading an object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelMarker {
    #[serde(rename = "*")]
    One,
    #[serde(rename = "**")]
    Two,
    #[serde(rename = "***")]
    Three,
    #[serde(rename = "4*")]
    Four,
    #[serde(rename = "5*")]
    Five,
    #[serde(rename = "6*")]
    Six,
}

impl LevelMarker {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "*" => Some(Self::One),
            "**" => Some(Self::Two),
            "***" => Some(Self::Three),
            "4*" => Some(Self::Four),
            "5*" => Some(Self::Five),
            "6*" => Some(Self::Six),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "*",
            Self::Two => "**",
            Self::Three => "***",
            Self::Four => "4*",
            Self::Five => "5*",
            Self::Six => "6*",
        }
    }

    pub fn depth(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
        }
    }
}

/// A table row plus its derived level, description and identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbsRow {
    pub level: Option<LevelMarker>,
    pub description: String,
    pub id: Option<String>,
    /// Remaining source cells, aligned with [`WbsTable::columns`].
    pub cells: Vec<CellValue>,
}

impl WbsRow {
    /// Level marker text; blank when the row has no marker.
    pub fn level_label(&self) -> &'static str {
        self.level.map(|l| l.as_str()).unwrap_or("")
    }

    /// Trimmed identifier, `None` when absent or blank.
    pub fn trimmed_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Parsed WBS rows of one export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WbsTable {
    /// Source columns left after the detail columns were consumed.
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<WbsRow>,
    /// Set by the line cleaner for aggregated exports; suppresses classification.
    pub summary_export: bool,
}

impl WbsTable {
    /// Identifiers in row order, blanks included as `None`.
    pub fn ids(&self) -> impl Iterator<Item = Option<&str>> {
        self.rows.iter().map(|r| r.id.as_deref())
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Two-way partition of the distinct identifiers of a table.
///
/// Both lists keep first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub summary: Vec<String>,
    pub transaction: Vec<String>,
}

impl Classification {
    pub fn is_summary(&self, id: &str) -> bool {
        let id = id.trim();
        self.summary.iter().any(|s| s == id)
    }

    pub fn is_transaction(&self, id: &str) -> bool {
        let id = id.trim();
        self.transaction.iter().any(|s| s == id)
    }

    /// Number of distinct identifiers classified.
    pub fn len(&self) -> usize {
        self.summary.len() + self.transaction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
