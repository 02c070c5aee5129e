//! Summary / transaction classification of WBS identifiers.
//!
//! Identifiers carry no parent pointer. An identifier is a summary node when
//! some other identifier in the same table is exactly it plus one `-NN`
//! child segment; otherwise it is a transaction node. No tree is built.
//!
//! Two strategies compute the same partition:
//! - [`ClassificationStrategy::AllPairs`]: a full-match regex per identifier,
//!   tested against every other identifier (O(k²))
//! - [`ClassificationStrategy::SuffixLookup`]: look up `-00`..`-99` in a set (O(k·100))

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::logs::log_info_indent;
use crate::models::{Classification, WbsTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationStrategy {
    AllPairs,
    SuffixLookup,
}

/// Trim, drop blanks, dedupe; first occurrence wins.
pub fn dedup_ids<'a>(ids: impl IntoIterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .flatten()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

/// Partition identifiers into summary and transaction nodes.
pub fn classify<'a>(
    ids: impl IntoIterator<Item = Option<&'a str>>,
    strategy: ClassificationStrategy,
) -> Classification {
    let distinct = dedup_ids(ids);
    let parents: Vec<bool> = match strategy {
        ClassificationStrategy::AllPairs => all_pairs(&distinct),
        ClassificationStrategy::SuffixLookup => suffix_lookup(&distinct),
    };

    let mut classification = Classification::default();
    for (id, is_parent) in distinct.into_iter().zip(parents) {
        if is_parent {
            classification.summary.push(id);
        } else {
            classification.transaction.push(id);
        }
    }
    classification
}

/// Classify a table; summary exports have every identifier as a transaction.
pub fn classify_table(table: &WbsTable, strategy: ClassificationStrategy) -> Classification {
    if table.summary_export {
        log_info_indent("Summary export: classification skipped", 1);
        return Classification {
            summary: Vec::new(),
            transaction: dedup_ids(table.ids()),
        };
    }
    classify(table.ids(), strategy)
}

fn child_pattern(parent: &str) -> Option<Regex> {
    Regex::new(&format!("^{}-[0-9]{{2}}$", regex::escape(parent))).ok()
}

fn all_pairs(distinct: &[String]) -> Vec<bool> {
    distinct
        .iter()
        .enumerate()
        .map(|(i, parent)| match child_pattern(parent) {
            Some(pattern) => distinct
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && pattern.is_match(other)),
            None => false,
        })
        .collect()
}

fn suffix_lookup(distinct: &[String]) -> Vec<bool> {
    let set: HashSet<&str> = distinct.iter().map(String::as_str).collect();
    distinct
        .iter()
        .map(|parent| {
            (0..100).any(|n| set.contains(format!("{}-{:02}", parent, n).as_str()))
        })
        .collect()
}


// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------
