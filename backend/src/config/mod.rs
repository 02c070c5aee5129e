//! Runtime settings and per-variant configuration.
//!
//! Settings come from environment variables, with a `.env` file honoured:
//!
//! | Variable | Default |
//! |---|---|
//! | `WBSREPORT_MASTER_FILE` | `data/WBS_NAMES.XLSX` |
//! | `WBSREPORT_MASTER_KEY_FIELD` | `WBS_element` |
//! | `WBSREPORT_MASTER_VALUE_FIELD` | `Name` |
//! | `WBSREPORT_REPORTS_DIR` | `data/reports` |
//! | `WBSREPORT_WORK_DIR` | system temp dir |
//! | `WBSREPORT_STRICT_MASTER` | unset (warn and continue) |
//!
//! Report outputs given as a bare file name are written under the reports
//! directory; paths with a directory part are used as given.

pub mod variant;

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cache::{MasterDataPolicy, MasterSource};

pub use variant::{ReportVariant, SourceFormat, VariantConfig};

pub const DEFAULT_MASTER_FILE: &str = "data/WBS_NAMES.XLSX";
pub const DEFAULT_MASTER_KEY_FIELD: &str = "WBS_element";
pub const DEFAULT_MASTER_VALUE_FIELD: &str = "Name";
pub const DEFAULT_REPORTS_DIR: &str = "data/reports";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub master_file: PathBuf,
    pub master_key_field: String,
    pub master_value_field: String,
    /// Where bare output file names are written
    pub reports_dir: PathBuf,
    /// Where cleaned intermediate files are written
    pub work_dir: PathBuf,
    pub strict_master: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Settings from the environment (loading `.env` first if present)
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Settings from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            master_file: get("WBSREPORT_MASTER_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MASTER_FILE)),
            master_key_field: get("WBSREPORT_MASTER_KEY_FIELD")
                .unwrap_or_else(|| DEFAULT_MASTER_KEY_FIELD.to_string()),
            master_value_field: get("WBSREPORT_MASTER_VALUE_FIELD")
                .unwrap_or_else(|| DEFAULT_MASTER_VALUE_FIELD.to_string()),
            reports_dir: get("WBSREPORT_REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR)),
            work_dir: get("WBSREPORT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            strict_master: get("WBSREPORT_STRICT_MASTER")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn master_source(&self) -> MasterSource {
        MasterSource {
            path: self.master_file.clone(),
            key_field: self.master_key_field.clone(),
            value_field: self.master_value_field.clone(),
        }
    }

    /// Place a bare file name under the reports directory.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        let bare = path.is_relative()
            && path.parent().map_or(true, |p| p.as_os_str().is_empty());
        if bare {
            self.reports_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub fn master_policy(&self) -> MasterDataPolicy {
        if self.strict_master {
            MasterDataPolicy::Strict
        } else {
            MasterDataPolicy::WarnAndContinue
        }
    }
}
