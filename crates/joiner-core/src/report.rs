//! Run report describing what a merge did
//!
//! Written as JSON next to the output when requested, so a run can be
//! audited without re-running it.

use crate::config::KeyCandidates;
use crate::error::{Error, Result};
use crate::merger::{MergePolicy, MergedStore};
use crate::projector::Projection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What one input table contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Input file
    pub path: PathBuf,
    /// Header name matched as the key, None when the table was skipped
    pub key_column: Option<String>,
    /// Data rows read (header excluded)
    pub data_rows: usize,
    /// Rows too short to hold a key cell
    pub malformed_rows: usize,
    /// Rows whose key was not in the base set (inner join only)
    pub unmatched_rows: usize,
    /// Base records removed because this table lacked their key
    pub evicted_records: usize,
    /// Table had no data rows and contributed nothing
    pub skipped_empty: bool,
}

impl TableSummary {
    /// Summary for a table being folded
    pub fn new(path: &Path, key_column: &str, data_rows: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            key_column: Some(key_column.to_string()),
            data_rows,
            malformed_rows: 0,
            unmatched_rows: 0,
            evicted_records: 0,
            skipped_empty: false,
        }
    }

    /// Summary for a table without data rows
    pub fn skipped(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            key_column: None,
            data_rows: 0,
            malformed_rows: 0,
            unmatched_rows: 0,
            evicted_records: 0,
            skipped_empty: true,
        }
    }
}

/// Summary of a whole merge run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    /// When the report was created
    pub generated_at: DateTime<Utc>,
    pub policy: MergePolicy,
    /// Key candidates from the config, as written
    pub key_candidates: Vec<String>,
    /// Canonical key column of the output
    pub key_column: Option<String>,
    /// Input tables in merge order
    pub tables: Vec<TableSummary>,
    /// Merged records before projection
    pub merged_records: usize,
    /// Records removed by the inner join
    pub evicted_records: usize,
    /// Records not emitted (blank key or no data)
    pub suppressed_rows: usize,
    /// Columns dropped for never carrying data
    pub dropped_columns: Vec<String>,
    /// Columns in the output
    pub column_count: usize,
    /// Data rows in the output
    pub row_count: usize,
    /// Where the merged table was written
    pub output: Option<PathBuf>,
}

impl MergeReport {
    /// Start a report from the merged store, before it is projected
    pub fn new(candidates: &KeyCandidates, store: &MergedStore) -> Self {
        Self {
            generated_at: Utc::now(),
            policy: store.policy(),
            key_candidates: candidates.names().to_vec(),
            key_column: store.key_column().map(str::to_string),
            tables: store.tables().to_vec(),
            merged_records: store.len(),
            evicted_records: store.evicted(),
            suppressed_rows: 0,
            dropped_columns: Vec::new(),
            column_count: 0,
            row_count: 0,
            output: None,
        }
    }

    /// Fill in the projection results
    pub fn record_projection(&mut self, projection: &Projection) {
        self.suppressed_rows = projection.suppressed_rows;
        self.dropped_columns = projection.dropped_columns.clone();
        self.column_count = projection.headers.len();
        self.row_count = projection.rows.len();
    }

    /// Number of input tables skipped as empty
    pub fn skipped_tables(&self) -> usize {
        self.tables.iter().filter(|t| t.skipped_empty).count()
    }

    /// Load a report from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the report to a file as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
