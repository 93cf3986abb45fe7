//! Key candidate configuration
//!
//! The config file is a JSON array of column names that are all accepted as
//! the join key, e.g. `["id", "ID", "Identifier"]`.

use crate::error::{Error, Result};
use crate::resolver::normalize;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Accepted names for the join key column, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyCandidates {
    names: Vec<String>,
}

impl KeyCandidates {
    /// Build a candidate set, dropping blanks and normalized duplicates.
    ///
    /// Returns `None` when nothing usable is left.
    pub fn new<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            let normalized = normalize(&name);
            if normalized.is_empty() || kept.iter().any(|k| normalize(k) == normalized) {
                continue;
            }
            kept.push(name);
        }

        if kept.is_empty() {
            None
        } else {
            Some(Self { names: kept })
        }
    }

    /// Load candidates from a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let names: Vec<String> = serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let candidates = Self::new(names).ok_or_else(|| Error::NoKeyCandidates {
            path: path.to_path_buf(),
        })?;
        tracing::debug!(path = %path.display(), candidates = ?candidates.names, "loaded key candidates");
        Ok(candidates)
    }

    /// Candidate names as written in the config
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True when `column` matches any candidate, ignoring case and surrounding whitespace
    pub fn matches(&self, column: &str) -> bool {
        let column = normalize(column);
        self.names.iter().any(|name| normalize(name) == column)
    }
}
