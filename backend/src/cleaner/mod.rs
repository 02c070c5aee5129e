//! Line cleaner: strips export boilerplate before tabular parsing.
//!
//! Each report variant removes a fixed set of line indices. Negative indices
//! count from the end and are resolved against the line count first. The
//! standard budget report decides between two patterns by probing where the
//! `Object` header line sits.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FileError, FileResult};
use crate::logs::{log_info, log_info_indent};
use crate::parser::{read_lines, SourceEncoding};

// =============================================================================
// Patterns
// =============================================================================

/// Zero-based line indices to remove; negative values are offsets from the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningPattern {
    pub remove: Vec<isize>,
}

impl CleaningPattern {
    pub fn new(remove: &[isize]) -> Self {
        Self {
            remove: remove.to_vec(),
        }
    }

    /// Resolve against `n` lines. Indices outside `0..n` are ignored.
    pub fn resolve(&self, n: usize) -> BTreeSet<usize> {
        let n = n as isize;
        self.remove
            .iter()
            .map(|&i| if i < 0 { n + i } else { i })
            .filter(|&i| i >= 0 && i < n)
            .map(|i| i as usize)
            .collect()
    }

    /// Drop the resolved indices, keeping the order of everything else.
    pub fn apply(&self, lines: Vec<String>) -> Vec<String> {
        let drop = self.resolve(lines.len());
        lines
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !drop.contains(i))
            .map(|(_, line)| line)
            .collect()
    }
}

/// How a variant chooses its pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CleaningRule {
    Fixed(CleaningPattern),
    /// Look for the first line whose leading token is `sentinel`.
    ///
    /// Found at `line_index`: single-project export, `single` applies.
    /// Anywhere else (or nowhere): aggregated export, `summary` applies and
    /// the result is flagged as a summary export.
    SentinelCheck {
        sentinel: String,
        line_index: usize,
        single: CleaningPattern,
        summary: CleaningPattern,
    },
}

// =============================================================================
// Cleaning
// =============================================================================

/// Cleaned lines plus what the cleaner decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedLines {
    pub lines: Vec<String>,
    pub summary_export: bool,
    /// Number of lines removed.
    pub removed: usize,
}

/// Index of the first line whose first whitespace token equals `sentinel`.
pub fn find_sentinel(lines: &[String], sentinel: &str) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.split_whitespace().next() == Some(sentinel))
}

/// Apply a cleaning rule to in-memory lines.
pub fn clean_lines(lines: Vec<String>, rule: &CleaningRule) -> CleanedLines {
    let before = lines.len();
    let (pattern, summary_export) = match rule {
        CleaningRule::Fixed(pattern) => (pattern, false),
        CleaningRule::SentinelCheck {
            sentinel,
            line_index,
            single,
            summary,
        } => match find_sentinel(&lines, sentinel) {
            Some(i) if i == *line_index => {
                log_info_indent(format!("'{}' header at line {}: single-project export", sentinel, i + 1), 1);
                (single, false)
            }
            found => {
                let at = found
                    .map(|i| format!("line {}", i + 1))
                    .unwrap_or_else(|| "no line".to_string());
                log_info_indent(format!("'{}' header at {}: summary export", sentinel, at), 1);
                (summary, true)
            }
        },
    };

    let lines = pattern.apply(lines);
    CleanedLines {
        removed: before - lines.len(),
        lines,
        summary_export,
    }
}

/// Clean `input` into `output` (written as UTF-8). The input is untouched.
pub fn clean_file(
    input: &Path,
    output: &Path,
    rule: &CleaningRule,
    encoding: SourceEncoding,
) -> FileResult<CleanedLines> {
    let lines = read_lines(input, encoding)?;
    let cleaned = clean_lines(lines, rule);

    let mut content = cleaned.lines.join("\n");
    content.push('\n');
    std::fs::write(output, content).map_err(FileError::io(output))?;

    log_info(format!(
        "Cleaned {}: removed {} line(s), {} remain",
        input.display(),
        cleaned.removed,
        cleaned.lines.len()
    ));
    Ok(cleaned)
}
