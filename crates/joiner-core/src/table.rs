//! Core table types for representing delimited input files

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed table from a single input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, taken from the header row
    pub columns: Vec<Column>,
    /// Data rows (header excluded)
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
}

impl Table {
    /// Create a new empty table
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            source_path,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A table without data rows contributes nothing to a merge
    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Header names in column order
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find a column by exact name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as written in the header
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// A row of data.
///
/// Cells are positionally aligned to the header. A row may be shorter than
/// the header; the missing trailing cells are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Raw cell values
    pub cells: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Number of cells actually present
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// True when a cell carries no data (empty or whitespace only)
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
