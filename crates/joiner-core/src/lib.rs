//! joiner-core: Core library for joining tabular files on a shared key column
//!
//! This library provides functionality to:
//! - Parse delimited files into tables
//! - Load the list of accepted key column names from a JSON config
//! - Resolve the key column of each table
//! - Fold tables into key-matched records (inner join or accumulate)
//! - Project the merged records into an ordered header and filtered rows
//! - Write the result back out and report what the run did

pub mod config;
pub mod error;
pub mod merger;
pub mod parser;
pub mod projector;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod table;
pub mod writer;

pub use config::KeyCandidates;
pub use error::{Error, Result};
pub use merger::{merge_files, merge_tables, MergeOptions, MergePolicy, MergedRecord, MergedStore};
pub use parser::{parse_csv, parse_csv_str, DEFAULT_DELIMITER};
pub use projector::{project, Projection};
pub use report::{MergeReport, TableSummary};
pub use resolver::{require_key, resolve_key, JoinKey, KeyColumn};
pub use scanner::expand_inputs;
pub use table::{Column, Row, Table};
pub use writer::write_csv;
