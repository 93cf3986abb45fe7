//! Join key resolution
//!
//! Finds which header column of a table holds the join key, and normalizes
//! key values so rows from different files line up.

use crate::config::KeyCandidates;
use crate::error::{Error, Result};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The column a table joins on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumn {
    /// Position of the key in the header
    pub index: usize,
    /// Header name exactly as written in the file
    pub name: String,
}

/// Normalized join key value: trimmed and case-folded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinKey(String);

impl JoinKey {
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank keys never reach the output
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim surrounding whitespace and fold case
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Find the key column in a header.
///
/// Header positions are scanned left to right and the first column matching
/// any candidate wins, regardless of candidate order.
pub fn resolve_key(header: &[Column], candidates: &KeyCandidates) -> Option<KeyColumn> {
    header
        .iter()
        .find(|column| candidates.matches(&column.name))
        .map(|column| KeyColumn {
            index: column.index,
            name: column.name.clone(),
        })
}

/// Resolve the key column of a table or fail with `KeyNotFound`
pub fn require_key(table: &Table, candidates: &KeyCandidates) -> Result<KeyColumn> {
    resolve_key(&table.columns, candidates).ok_or_else(|| Error::KeyNotFound {
        path: table.source_path.clone(),
        candidates: candidates.names().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn header(names: &[&str]) -> Vec<Column> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(*name, i))
            .collect()
    }

    #[test]
    fn test_resolve_case_and_whitespace_insensitive() {
        let candidates = KeyCandidates::new(["email"]).unwrap();
        let key = resolve_key(&header(&["name", " Email "]), &candidates).unwrap();
        assert_eq!(key.index, 1);
        assert_eq!(key.name, " Email ");
    }

    #[test]
    fn test_resolve_first_header_column_wins() {
        // "id" has higher candidate priority but "uid" comes first in the header
        let candidates = KeyCandidates::new(["id", "uid"]).unwrap();
        let key = resolve_key(&header(&["uid", "name", "ID"]), &candidates).unwrap();
        assert_eq!(key.index, 0);
        assert_eq!(key.name, "uid");
    }

    #[test]
    fn test_resolve_not_found() {
        let candidates = KeyCandidates::new(["id"]).unwrap();
        assert!(resolve_key(&header(&["uid", "age"]), &candidates).is_none());
        assert!(resolve_key(&[], &candidates).is_none());
    }

    #[test]
    fn test_require_key_reports_path() {
        let table = parse_csv_str("uid,age\n1,30\n", "b.csv").unwrap();
        let candidates = KeyCandidates::new(["id"]).unwrap();

        match require_key(&table, &candidates) {
            Err(Error::KeyNotFound { path, candidates }) => {
                assert_eq!(path, std::path::PathBuf::from("b.csv"));
                assert_eq!(candidates, vec!["id".to_string()]);
            }
            other => panic!("expected KeyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_join_key_normalization() {
        assert_eq!(JoinKey::new("  Alice@Example.com "), JoinKey::new("alice@example.com"));
        assert!(JoinKey::new("   ").is_blank());
        assert_eq!(JoinKey::new(" X1 ").to_string(), "x1");
    }
}
