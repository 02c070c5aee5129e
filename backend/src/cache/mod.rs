//! Master data - identifier to canonical name lookup
//!
//! The master table is maintained outside this tool as a spreadsheet (or a
//! delimited text export) with an identifier column and a name column. It is
//! loaded once and held by a [`MasterDataCache`] that the caller owns, so
//! tests can inject a fresh or pre-populated index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{MasterDataError, MasterDataResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::parser::{detect_delimiter, read_source, SourceEncoding};

// =============================================================================
// Sheet Records
// =============================================================================

/// Header plus string rows of the first sheet of a tabular source.
#[derive(Debug, Clone, Default)]
pub struct SheetRecords {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetRecords {
    /// Index of a header, ignoring surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Trimmed values of one column, blanks skipped.
    pub fn values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |r| r.get(column))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Read the first sheet of a spreadsheet, or a delimited text file.
///
/// The first non-blank row is the header. Fully blank rows are skipped.
pub fn load_sheet_records(path: &Path) -> MasterDataResult<SheetRecords> {
    if !path.exists() {
        return Err(MasterDataError::SourceMissing(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let rows = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        "csv" | "tsv" | "txt" => read_delimited(path)?,
        other => return Err(MasterDataError::UnsupportedFormat(other.to_string())),
    };

    let mut rows = rows
        .into_iter()
        .filter(|r| r.iter().any(|v| !v.trim().is_empty()));
    let headers = rows
        .next()
        .map(|h| h.into_iter().map(|v| v.trim().to_string()).collect())
        .unwrap_or_default();

    Ok(SheetRecords {
        headers,
        rows: rows.collect(),
    })
}

fn read_workbook(path: &Path) -> MasterDataResult<Vec<Vec<String>>> {
    let unreadable = |message: String| MasterDataError::Unreadable {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable("workbook has no worksheet".to_string()))?
        .map_err(|e| unreadable(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

fn read_delimited(path: &Path) -> MasterDataResult<Vec<Vec<String>>> {
    let content =
        read_source(path, SourceEncoding::Detect).map_err(|e| MasterDataError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let delimiter = detect_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    reader
        .records()
        .map(|r| {
            r.map(|record| record.iter().map(str::to_string).collect())
                .map_err(|e| MasterDataError::Unreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
        })
        .collect()
}

// =============================================================================
// Master Data Index
// =============================================================================

/// Exact-match identifier -> name lookup; keys and values are stored trimmed.
#[derive(Debug, Clone, Serialize)]
pub struct MasterDataIndex {
    entries: HashMap<String, String>,
    /// Where the index came from (None when built in memory)
    pub source: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
    /// Keys seen more than once; the last occurrence wins
    pub duplicates: usize,
}

impl MasterDataIndex {
    /// Build from `(identifier, name)` pairs. Blank identifiers are skipped.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = HashMap::new();
        let mut duplicates = 0;
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            if entries
                .insert(key.to_string(), value.as_ref().trim().to_string())
                .is_some()
            {
                duplicates += 1;
            }
        }
        Self {
            entries,
            source: None,
            loaded_at: Utc::now(),
            duplicates,
        }
    }

    /// Look up a name; the identifier is trimmed first.
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.entries.get(id.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load the master index from `path` using the named key and value columns.
pub fn load_master_index(
    path: &Path,
    key_field: &str,
    value_field: &str,
) -> MasterDataResult<MasterDataIndex> {
    let records = load_sheet_records(path)?;

    let missing = |field: &str| MasterDataError::MissingField {
        path: path.to_path_buf(),
        field: field.to_string(),
    };
    let key_col = records.column(key_field).ok_or_else(|| missing(key_field))?;
    let value_col = records.column(value_field).ok_or_else(|| missing(value_field))?;

    let pairs = records.rows.iter().map(|row| {
        let get = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        (get(key_col), get(value_col))
    });

    let mut index = MasterDataIndex::from_pairs(pairs);
    index.source = Some(path.to_path_buf());
    Ok(index)
}

// =============================================================================
// Cache
// =============================================================================

/// What to do when the master source is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MasterDataPolicy {
    /// Any master-data error aborts the run.
    Strict,
    /// A missing or unreadable source is logged and rows pass through unmapped.
    /// Configuration errors (missing key/value column) still abort.
    WarnAndContinue,
}

/// Where to load the master index from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterSource {
    pub path: PathBuf,
    pub key_field: String,
    pub value_field: String,
}

/// Process-scoped holder of the master index.
///
/// Loads lazily on first use and keeps the index until [`invalidate`] or
/// [`reload`] is called.
///
/// [`invalidate`]: MasterDataCache::invalidate
/// [`reload`]: MasterDataCache::reload
#[derive(Debug)]
pub struct MasterDataCache {
    source: MasterSource,
    index: Option<MasterDataIndex>,
}

impl MasterDataCache {
    pub fn new(source: MasterSource) -> Self {
        Self {
            source,
            index: None,
        }
    }

    /// A cache already holding `index`.
    pub fn with_index(source: MasterSource, index: MasterDataIndex) -> Self {
        Self {
            source,
            index: Some(index),
        }
    }

    pub fn source(&self) -> &MasterSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.index.is_some()
    }

    /// The cached index, loading it on first use.
    pub fn get_or_load(&mut self) -> MasterDataResult<&MasterDataIndex> {
        let index = match self.index.take() {
            Some(index) => index,
            None => self.load()?,
        };
        Ok(self.index.insert(index))
    }

    /// Drop the cached index and load again from the source.
    pub fn reload(&mut self) -> MasterDataResult<&MasterDataIndex> {
        self.index = None;
        self.get_or_load()
    }

    pub fn invalidate(&mut self) {
        if self.index.take().is_some() {
            log_info("Master data cache invalidated");
        }
    }

    /// The index under `policy`; `Ok(None)` means continue unmapped.
    pub fn resolve(&mut self, policy: MasterDataPolicy) -> MasterDataResult<Option<&MasterDataIndex>> {
        match self.get_or_load() {
            Ok(index) => Ok(Some(index)),
            Err(e) if e.is_unavailable() && policy == MasterDataPolicy::WarnAndContinue => {
                log_warning(format!("{}; descriptions left unmapped", e));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn load(&self) -> MasterDataResult<MasterDataIndex> {
        let index = load_master_index(
            &self.source.path,
            &self.source.key_field,
            &self.source.value_field,
        )?;
        log_success(format!(
            "Master data loaded: {} entries from {}",
            index.len(),
            self.source.path.display()
        ));
        if index.duplicates > 0 {
            log_warning(format!(
                "Master data has {} duplicate identifier(s); last entry kept",
                index.duplicates
            ));
        }
        Ok(index)
    }
}
