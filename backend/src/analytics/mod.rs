//! Project-ID analytics.
//!
//! Independent of the WBS pipeline. Scans export lines for `PRJ <id>`,
//! decodes the company and project-type codes embedded in each project id
//! and cross-tabulates them. Also groups project definitions into
//! company/type buckets for the project-type-wise summary.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::cache::load_sheet_records;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::logs::{log_info, log_success};
use crate::parser::{read_lines, SourceEncoding};

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_PROJECT_TYPE: &str = "Unknown Project Type";
pub const TOTAL_LABEL: &str = "Total";
pub const PROJECT_DEFINITION_COLUMN: &str = "Project definition";

static PROJECT_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PRJ\s+([A-Za-z0-9-]+)").expect("project id pattern is a valid regex")
});

// =============================================================================
// Code Book
// =============================================================================

/// Lookup tables for company and project-type codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBook {
    pub companies: HashMap<String, String>,
    pub project_types: HashMap<String, String>,
}

impl Default for CodeBook {
    fn default() -> Self {
        let table = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            companies: table(&[
                ("NL", "NLCIL"),
                ("NT", "NTPL"),
                ("NU", "NUPPL"),
                ("NR", "NIRL"),
                ("NG", "NIGEL"),
            ]),
            project_types: table(&[
                ("S", "Service"),
                ("I", "Income"),
                ("N", "Non-Plan"),
                ("C", "Capex"),
                ("E", "Excetra"),
                ("F", "Feasibility"),
                ("R", "R&D"),
                ("O", "Opex"),
                ("M", "Material"),
            ]),
        }
    }
}

impl CodeBook {
    pub fn company(&self, code: &str) -> &str {
        self.companies
            .get(code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_COMPANY)
    }

    pub fn project_type(&self, code: &str) -> &str {
        self.project_types
            .get(code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_PROJECT_TYPE)
    }

    /// Map one hyphen segment through either table, unknown segments unchanged.
    fn segment<'a>(&'a self, segment: &'a str) -> &'a str {
        self.companies
            .get(segment)
            .or_else(|| self.project_types.get(segment))
            .map(String::as_str)
            .unwrap_or(segment)
    }
}

// =============================================================================
// Project Extraction
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub project_type: String,
    pub company: String,
    pub project_id: String,
}

/// Decode one project id: company from the first two characters, type from the fourth.
pub fn decode_project(project_id: &str, codebook: &CodeBook) -> ProjectRecord {
    let company_code: String = project_id.chars().take(2).collect();
    let type_code: String = project_id.chars().nth(3).map(String::from).unwrap_or_default();
    ProjectRecord {
        project_type: codebook.project_type(&type_code).to_string(),
        company: codebook.company(&company_code).to_string(),
        project_id: project_id.to_string(),
    }
}

/// First `PRJ <id>` match of each line, decoded.
pub fn extract_projects<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    codebook: &CodeBook,
) -> Vec<ProjectRecord> {
    lines
        .into_iter()
        .filter_map(|line| PROJECT_ID_REGEX.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_project(m.as_str(), codebook))
        .collect()
}

// =============================================================================
// Contingency Table
// =============================================================================

/// Counts by project type (rows) and company (columns), with `Total` margins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
    pub row_totals: Vec<usize>,
    pub column_totals: Vec<usize>,
    pub grand_total: usize,
}

impl ContingencyTable {
    /// Count for a (type, company) pair; zero when unobserved.
    pub fn get(&self, project_type: &str, company: &str) -> usize {
        let row = self.row_labels.iter().position(|l| l == project_type);
        let col = self.column_labels.iter().position(|l| l == company);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    /// Table as text rows, header first, including the `Total` row and column.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let mut header = vec![String::new()];
        header.extend(self.column_labels.iter().cloned());
        header.push(TOTAL_LABEL.to_string());

        let mut rows = vec![header];
        for (i, label) in self.row_labels.iter().enumerate() {
            let mut row = vec![label.clone()];
            row.extend(self.counts[i].iter().map(|n| n.to_string()));
            row.push(self.row_totals[i].to_string());
            rows.push(row);
        }

        let mut totals = vec![TOTAL_LABEL.to_string()];
        totals.extend(self.column_totals.iter().map(|n| n.to_string()));
        totals.push(self.grand_total.to_string());
        rows.push(totals);
        rows
    }
}

/// Cross-tabulate records; labels are sorted.
pub fn cross_tabulate(records: &[ProjectRecord]) -> ContingencyTable {
    let row_labels: Vec<String> = records
        .iter()
        .map(|r| r.project_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let column_labels: Vec<String> = records
        .iter()
        .map(|r| r.company.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut counts = vec![vec![0usize; column_labels.len()]; row_labels.len()];
    for record in records {
        let r = row_labels.binary_search(&record.project_type);
        let c = column_labels.binary_search(&record.company);
        if let (Ok(r), Ok(c)) = (r, c) {
            counts[r][c] += 1;
        }
    }

    let row_totals: Vec<usize> = counts.iter().map(|row| row.iter().sum()).collect();
    let column_totals: Vec<usize> = (0..column_labels.len())
        .map(|c| counts.iter().map(|row| row[c]).sum())
        .collect();

    ContingencyTable {
        grand_total: row_totals.iter().sum(),
        row_labels,
        column_labels,
        counts,
        row_totals,
        column_totals,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalysis {
    pub records: Vec<ProjectRecord>,
    pub table: ContingencyTable,
}

/// Extract and cross-tabulate the projects of an export file.
pub fn analyze_file(path: &Path, codebook: &CodeBook) -> AnalyticsResult<ProjectAnalysis> {
    let lines = read_lines(path, SourceEncoding::Latin1)?;
    let records = extract_projects(lines.iter().map(String::as_str), codebook);
    if records.is_empty() {
        return Err(AnalyticsError::NoData(path.to_path_buf()));
    }

    let table = cross_tabulate(&records);
    log_success(format!(
        "{} project(s) across {} type(s) and {} company code(s)",
        records.len(),
        table.row_labels.len(),
        table.column_labels.len()
    ));
    Ok(ProjectAnalysis { records, table })
}

// =============================================================================
// Project Type Wise
// =============================================================================

/// Unique projects of one company/type bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectGroup {
    /// e.g. `NLCIL-Capex`
    pub name: String,
    /// Distinct project definitions, first occurrence order
    pub projects: Vec<String>,
}

impl ProjectGroup {
    pub fn unique_projects(&self) -> usize {
        self.projects.len()
    }
}

/// Group project definitions by their first two hyphen segments, mapped through the code book.
///
/// Groups are sorted by name.
pub fn type_wise_summary<'a>(
    project_definitions: impl IntoIterator<Item = &'a str>,
    codebook: &CodeBook,
) -> Vec<ProjectGroup> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for definition in project_definitions {
        let definition = definition.trim();
        if definition.is_empty() {
            continue;
        }
        let name = definition
            .split('-')
            .take(2)
            .map(|segment| codebook.segment(segment))
            .collect::<Vec<_>>()
            .join("-");
        let projects = groups.entry(name).or_default();
        if !projects.iter().any(|p| p == definition) {
            projects.push(definition.to_string());
        }
    }

    groups
        .into_iter()
        .map(|(name, projects)| ProjectGroup { name, projects })
        .collect()
}

/// Read the `Project definition` column of a spreadsheet (or CSV) and group it.
pub fn type_wise_file(path: &Path, codebook: &CodeBook) -> AnalyticsResult<Vec<ProjectGroup>> {
    let records = load_sheet_records(path)?;
    let column = records
        .column(PROJECT_DEFINITION_COLUMN)
        .ok_or_else(|| AnalyticsError::MissingColumn(PROJECT_DEFINITION_COLUMN.to_string()))?;

    let groups = type_wise_summary(records.values(column), codebook);
    log_info(format!("{} project group(s) in {}", groups.len(), path.display()));
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_codes() {
        let lines = ["Cost centre report   PRJ NT-I-XYZ-045   page 1"];
        let records = extract_projects(lines, &CodeBook::default());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "NTPL");
        assert_eq!(records[0].project_type, "Income");
        assert_eq!(records[0].project_id, "NT-I-XYZ-045");
    }

    #[test]
    fn test_unknown_codes_default() {
        let records = extract_projects(["PRJ ZZ-Q-ABC-001", "PRJ NL"], &CodeBook::default());

        assert_eq!(records[0].company, UNKNOWN_COMPANY);
        assert_eq!(records[0].project_type, UNKNOWN_PROJECT_TYPE);
        assert_eq!(records[1].company, "NLCIL");
        assert_eq!(records[1].project_type, UNKNOWN_PROJECT_TYPE);
    }

    #[test]
    fn test_lines_without_marker_ignored() {
        let records = extract_projects(["NL-C-MN1-001 no marker", "PRJ", ""], &CodeBook::default());
        assert!(records.is_empty());
    }

    #[test]
    fn test_cross_tab_margins() {
        let codebook = CodeBook::default();
        let records = extract_projects(
            [
                "PRJ NL-C-AAA-001",
                "PRJ NL-C-AAA-002",
                "PRJ NT-C-BBB-001",
                "PRJ NT-I-BBB-002",
            ],
            &codebook,
        );
        let table = cross_tabulate(&records);

        assert_eq!(table.row_labels, vec!["Capex", "Income"]);
        assert_eq!(table.column_labels, vec!["NLCIL", "NTPL"]);
        assert_eq!(table.get("Capex", "NLCIL"), 2);
        assert_eq!(table.get("Income", "NLCIL"), 0);
        assert_eq!(table.row_totals, vec![3, 1]);
        assert_eq!(table.column_totals, vec![2, 2]);
        assert_eq!(table.grand_total, 4);

        let rows = table.to_rows();
        assert_eq!(rows[0], vec!["", "NLCIL", "NTPL", "Total"]);
        assert_eq!(rows[3], vec!["Total", "2", "2", "4"]);
    }

    #[test]
    fn test_analyze_file_without_projects_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.DAT");
        std::fs::write(&path, "header\nno projects here\n").unwrap();

        let err = analyze_file(&path, &CodeBook::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::NoData(_)));
    }

    #[test]
    fn test_analyze_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.DAT");
        std::fs::write(&path, "title\nPRJ NU-S-P01-001\tx\nPRJ NU-S-P01-002\ty\n").unwrap();

        let analysis = analyze_file(&path, &CodeBook::default()).unwrap();
        assert_eq!(analysis.table.get("Service", "NUPPL"), 2);
    }

    #[test]
    fn test_type_wise_groups_unique_projects() {
        let definitions = [
            "NL-C-001-01",
            "NL-C-001-01",
            "NL-C-002",
            "NT-O-010",
            "XX-C-001",
            "  ",
        ];
        let groups = type_wise_summary(definitions, &CodeBook::default());

        let summary: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.name.as_str(), g.unique_projects()))
            .collect();
        assert_eq!(
            summary,
            vec![("NLCIL-Capex", 2), ("NTPL-Opex", 1), ("XX-Capex", 1)]
        );
    }

    #[test]
    fn test_type_wise_file_requires_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cn42n.csv");
        std::fs::write(&path, "Project,Name\nNL-C-001,x\n").unwrap();

        let err = type_wise_file(&path, &CodeBook::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingColumn(_)));

        std::fs::write(&path, "Project definition,Name\nNL-C-001,x\nNL-C-002,y\n").unwrap();
        let groups = type_wise_file(&path, &CodeBook::default()).unwrap();
        assert_eq!(groups[0].name, "NLCIL-Capex");
        assert_eq!(groups[0].unique_projects(), 2);
    }
}
