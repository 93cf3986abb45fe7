//! CSV parser for input tables

use crate::error::{Error, Result};
use crate::table::{Column, Row, Table};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Default field delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Parse a delimited file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_table(BufReader::new(file), path.to_path_buf(), delimiter)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    read_table(content.as_bytes(), PathBuf::from(source_name), DEFAULT_DELIMITER)
}

fn read_table<R: Read>(reader: R, path: PathBuf, delimiter: u8) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();

        // Short rows stay short; cells past the header have no column name
        if cells.len() > columns.len() {
            tracing::warn!(
                row = row_idx + 1,
                path = %path.display(),
                "row has more cells than columns, truncating"
            );
            cells.truncate(columns.len());
        }

        rows.push(Row::new(cells));
    }

    tracing::debug!(
        path = %path.display(),
        columns = columns.len(),
        rows = rows.len(),
        "parsed table"
    );

    Ok(Table {
        columns,
        rows,
        source_path: path,
    })
}
