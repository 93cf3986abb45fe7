//! Output projection: final header order and row filtering

use crate::merger::{MergePolicy, MergedRecord, MergedStore, StoreParts};
use crate::resolver::JoinKey;
use crate::table::is_blank;
use serde::{Deserialize, Serialize};

/// The merged table ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Output header, key column first
    pub headers: Vec<String>,
    /// Output rows aligned to `headers`
    pub rows: Vec<Vec<String>>,
    /// Records left out for a blank key or no data
    pub suppressed_rows: usize,
    /// Columns that were blank in every record (inner join only)
    pub dropped_columns: Vec<String>,
}

impl Projection {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column position by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Turn the merged store into headers and rows.
///
/// Headers keep first-seen order with the key column moved to the front.
/// Rows keep first-seen key order. A record is left out when its key is
/// blank or when every non-key cell is blank; missing cells become empty
/// strings.
pub fn project(store: MergedStore) -> Projection {
    let StoreParts {
        policy,
        key_column,
        columns,
        records,
    } = store.into_parts();

    let mut suppressed_rows = 0;
    let mut candidates: Vec<(JoinKey, MergedRecord)> = Vec::with_capacity(records.len());
    for (key, record) in records {
        if key.is_blank() {
            suppressed_rows += 1;
        } else {
            candidates.push((key, record));
        }
    }

    let mut headers: Vec<String> = columns
        .into_iter()
        .filter(|column| candidates.iter().any(|(_, r)| r.contains_key(column)))
        .collect();

    let mut dropped_columns = Vec::new();
    if policy == MergePolicy::InnerJoin {
        headers.retain(|column| {
            let carries_data = candidates
                .iter()
                .any(|(_, r)| r.get(column).is_some_and(|v| !is_blank(v)));
            if !carries_data {
                dropped_columns.push(column.clone());
            }
            carries_data
        });
    }

    let key_pos = key_column.as_ref().and_then(|key| {
        let pos = headers.iter().position(|h| h == key)?;
        let name = headers.remove(pos);
        headers.insert(0, name);
        Some(0)
    });
    // A key-only header has nothing else to check
    let has_data_columns = headers.len() > usize::from(key_pos.is_some());

    let mut rows = Vec::with_capacity(candidates.len());
    for (key, mut record) in candidates {
        let row: Vec<String> = headers
            .iter()
            .map(|h| record.swap_remove(h).unwrap_or_default())
            .collect();

        let all_blank = row
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != key_pos)
            .all(|(_, v)| is_blank(v));

        if has_data_columns && all_blank {
            tracing::debug!(key = %key, "suppressing record without data");
            suppressed_rows += 1;
            continue;
        }
        rows.push(row);
    }

    if !dropped_columns.is_empty() {
        tracing::info!(columns = ?dropped_columns, "dropped columns without data");
    }

    Projection {
        headers,
        rows,
        suppressed_rows,
        dropped_columns,
    }
}
