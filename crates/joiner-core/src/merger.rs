//! Merge engine for folding tables into key-matched records
//!
//! Each input table is folded, in order, into a [`MergedStore`]. Which rows
//! survive and how name collisions are handled depends on the run's
//! [`MergePolicy`], applied uniformly to every table.

use crate::config::KeyCandidates;
use crate::error::Result;
use crate::parser::{parse_csv, DEFAULT_DELIMITER};
use crate::report::TableSummary;
use crate::resolver::{require_key, JoinKey, KeyColumn};
use crate::table::Table;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// How rows from successive tables are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The first contributing table is the base; every later table narrows
    /// it to the keys it also contains and fills columns the base lacks.
    #[default]
    InnerJoin,
    /// Every key from every table survives; colliding columns get numeric
    /// suffixes so no value is overwritten.
    Accumulate,
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergePolicy::InnerJoin => write!(f, "inner-join"),
            MergePolicy::Accumulate => write!(f, "accumulate"),
        }
    }
}

/// Options for a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub policy: MergePolicy,
    /// Field delimiter of the input files
    pub delimiter: u8,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            policy: MergePolicy::default(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// One merged row: column name to cell value, in insertion order
pub type MergedRecord = IndexMap<String, String>;

/// Hands out `name_1`, `name_2`, ... per column name for one merge run
#[derive(Debug, Default)]
struct SuffixCounter {
    issued: HashMap<String, usize>,
}

impl SuffixCounter {
    fn next(&mut self, column: &str) -> String {
        let count = self.issued.entry(column.to_string()).or_insert(0);
        *count += 1;
        format!("{}_{}", column, count)
    }
}

/// Store contents consumed by the projector
pub(crate) struct StoreParts {
    pub policy: MergePolicy,
    pub key_column: Option<String>,
    pub columns: IndexSet<String>,
    pub records: IndexMap<JoinKey, MergedRecord>,
}

/// Accumulated state of one merge run
#[derive(Debug)]
pub struct MergedStore {
    policy: MergePolicy,
    records: IndexMap<JoinKey, MergedRecord>,
    /// Every column name ever written, in first-seen order
    columns: IndexSet<String>,
    /// Key header name from the first contributing table
    key_column: Option<String>,
    suffixes: SuffixCounter,
    tables: Vec<TableSummary>,
    evicted: usize,
}

impl MergedStore {
    /// Create an empty store for a run using `policy`
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            records: IndexMap::new(),
            columns: IndexSet::new(),
            key_column: None,
            suffixes: SuffixCounter::default(),
            tables: Vec::new(),
            evicted: 0,
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Canonical key column name, once a table has contributed rows
    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    /// Number of merged records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a merged record by its normalized key
    pub fn get(&self, key: &str) -> Option<&MergedRecord> {
        self.records.get(&JoinKey::new(key))
    }

    /// Merged records in first-seen key order
    pub fn records(&self) -> impl Iterator<Item = (&JoinKey, &MergedRecord)> {
        self.records.iter()
    }

    /// Column names in first-seen order, including ones only evicted records carried
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Per-table summaries in fold order
    pub fn tables(&self) -> &[TableSummary] {
        &self.tables
    }

    /// Records removed because a later table lacked their key
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Hand the accumulated state to the projector
    pub(crate) fn into_parts(self) -> StoreParts {
        StoreParts {
            policy: self.policy,
            key_column: self.key_column,
            columns: self.columns,
            records: self.records,
        }
    }

    /// Record a table that was skipped for having no data rows
    pub fn skip_table(&mut self, table: &Table) {
        tracing::info!(path = %table.source_path.display(), "skipping table without data rows");
        self.tables.push(TableSummary::skipped(&table.source_path));
    }

    /// Fold one table into the store using the run's policy
    pub fn fold_table(&mut self, table: &Table, key: &KeyColumn) {
        let canonical = self
            .key_column
            .get_or_insert_with(|| key.name.clone())
            .clone();
        self.columns.insert(canonical.clone());

        let mut summary = TableSummary::new(&table.source_path, &key.name, table.row_count());
        let is_base = !self.tables.iter().any(|t| !t.skipped_empty);

        match self.policy {
            MergePolicy::Accumulate => self.accumulate(table, key, &canonical, &mut summary),
            MergePolicy::InnerJoin if is_base => self.load_base(table, key, &canonical, &mut summary),
            MergePolicy::InnerJoin => self.narrow(table, key, &mut summary),
        }

        tracing::debug!(
            path = %table.source_path.display(),
            key = %key.name,
            rows = summary.data_rows,
            malformed = summary.malformed_rows,
            records = self.records.len(),
            "folded table"
        );

        self.tables.push(summary);
    }

    fn accumulate(
        &mut self,
        table: &Table,
        key: &KeyColumn,
        canonical: &str,
        summary: &mut TableSummary,
    ) {
        // Suffix assigned to each colliding column of this table
        let mut assigned: HashMap<usize, String> = HashMap::new();

        for row in &table.rows {
            let Some(raw_key) = row.get(key.index) else {
                summary.malformed_rows += 1;
                continue;
            };

            let record = self.records.entry(JoinKey::new(raw_key)).or_default();
            record
                .entry(canonical.to_string())
                .or_insert_with(|| raw_key.to_string());

            for (column, value) in table.columns.iter().zip(&row.cells) {
                if column.index == key.index {
                    continue;
                }

                let target = if !record.contains_key(&column.name) {
                    column.name.clone()
                } else {
                    let suffixes = &mut self.suffixes;
                    let planned = assigned
                        .entry(column.index)
                        .or_insert_with(|| suffixes.next(&column.name));
                    if !record.contains_key(planned.as_str()) {
                        planned.clone()
                    } else {
                        loop {
                            let fresh = suffixes.next(&column.name);
                            if !record.contains_key(&fresh) {
                                break fresh;
                            }
                        }
                    }
                };

                self.columns.insert(target.clone());
                record.insert(target, value.clone());
            }
        }
    }

    fn load_base(
        &mut self,
        table: &Table,
        key: &KeyColumn,
        canonical: &str,
        summary: &mut TableSummary,
    ) {
        for row in &table.rows {
            let Some(raw_key) = row.get(key.index) else {
                summary.malformed_rows += 1;
                continue;
            };

            let record = self.records.entry(JoinKey::new(raw_key)).or_default();
            record
                .entry(canonical.to_string())
                .or_insert_with(|| raw_key.to_string());
            fill_absent(record, &mut self.columns, table, key, &row.cells);
        }
    }

    fn narrow(&mut self, table: &Table, key: &KeyColumn, summary: &mut TableSummary) {
        let mut matched: HashSet<JoinKey> = HashSet::new();

        for row in &table.rows {
            let Some(raw_key) = row.get(key.index) else {
                summary.malformed_rows += 1;
                continue;
            };

            let join_key = JoinKey::new(raw_key);
            match self.records.get_mut(&join_key) {
                Some(record) => {
                    fill_absent(record, &mut self.columns, table, key, &row.cells);
                    matched.insert(join_key);
                }
                None => summary.unmatched_rows += 1,
            }
        }

        let before = self.records.len();
        self.records.retain(|k, _| matched.contains(k));
        let evicted = before - self.records.len();
        if evicted > 0 {
            tracing::debug!(
                path = %table.source_path.display(),
                evicted,
                "evicted records missing from table"
            );
        }
        summary.evicted_records = evicted;
        self.evicted += evicted;
    }
}

/// Copy non-key cells into `record` for columns it does not have yet
fn fill_absent(
    record: &mut MergedRecord,
    columns: &mut IndexSet<String>,
    table: &Table,
    key: &KeyColumn,
    cells: &[String],
) {
    for (column, value) in table.columns.iter().zip(cells) {
        if column.index == key.index || record.contains_key(&column.name) {
            continue;
        }
        columns.insert(column.name.clone());
        record.insert(column.name.clone(), value.clone());
    }
}

/// Merge already-parsed tables in order
pub fn merge_tables(
    tables: &[Table],
    candidates: &KeyCandidates,
    policy: MergePolicy,
) -> Result<MergedStore> {
    let mut store = MergedStore::new(policy);

    for table in tables {
        if !table.has_data() {
            store.skip_table(table);
            continue;
        }
        let key = require_key(table, candidates)?;
        store.fold_table(table, &key);
    }

    tracing::info!(
        policy = %policy,
        tables = tables.len(),
        records = store.len(),
        evicted = store.evicted(),
        "merged tables"
    );

    Ok(store)
}

/// Read and merge a list of files.
///
/// Every file is read before any merging starts, so an unreadable input
/// aborts the run without doing merge work.
pub fn merge_files<P: AsRef<Path>>(
    paths: &[P],
    candidates: &KeyCandidates,
    options: &MergeOptions,
) -> Result<MergedStore> {
    let mut tables: Vec<Table> = Vec::with_capacity(paths.len());
    for path in paths {
        tables.push(parse_csv(path, options.delimiter)?);
    }

    merge_tables(&tables, candidates, options.policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::parse_csv_str;

    fn tables(sources: &[(&str, &str)]) -> Vec<Table> {
        sources
            .iter()
            .map(|(name, content)| parse_csv_str(content, name).unwrap())
            .collect()
    }

    fn ids() -> KeyCandidates {
        KeyCandidates::new(["id"]).unwrap()
    }

    fn value<'a>(store: &'a MergedStore, key: &str, column: &str) -> Option<&'a str> {
        store.get(key)?.get(column).map(String::as_str)
    }

    #[test]
    fn test_accumulate_unions_disjoint_columns() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n2,Bob\n"),
            ("b.csv", "ID,age\n1,30\n3,41\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::Accumulate).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(value(&store, "1", "name"), Some("Alice"));
        assert_eq!(value(&store, "1", "age"), Some("30"));
        assert_eq!(value(&store, "2", "age"), None);
        assert_eq!(value(&store, "3", "age"), Some("41"));
        assert_eq!(store.key_column(), Some("id"));
        assert_eq!(store.columns().collect::<Vec<_>>(), vec!["id", "name", "age"]);
    }

    #[test]
    fn test_accumulate_never_overwrites_collisions() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n"),
            ("b.csv", "id,name\n1,Alicia\n"),
            ("c.csv", "id,name\n1,Ally\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::Accumulate).unwrap();

        assert_eq!(value(&store, "1", "name"), Some("Alice"));
        assert_eq!(value(&store, "1", "name_1"), Some("Alicia"));
        assert_eq!(value(&store, "1", "name_2"), Some("Ally"));
    }

    #[test]
    fn test_accumulate_suffix_is_per_table_occurrence() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n2,Bob\n"),
            ("b.csv", "id,name\n1,Alicia\n2,Bobby\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::Accumulate).unwrap();

        // Both records get the same sibling column for table b
        assert_eq!(value(&store, "1", "name_1"), Some("Alicia"));
        assert_eq!(value(&store, "2", "name_1"), Some("Bobby"));
        assert_eq!(store.columns().collect::<Vec<_>>(), vec!["id", "name", "name_1"]);
    }

    #[test]
    fn test_accumulate_duplicate_key_within_table() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n"),
            ("b.csv", "id,name\n1,Alicia\n1,Ali\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::Accumulate).unwrap();

        let record = store.get("1").unwrap();
        let names: Vec<&str> = record
            .iter()
            .filter(|(k, _)| k.starts_with("name"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "Alicia", "Ali"]);
    }

    #[test]
    fn test_accumulate_new_key_uses_plain_name() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n"),
            ("b.csv", "id,name\n2,Bob\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::Accumulate).unwrap();

        assert_eq!(value(&store, "2", "name"), Some("Bob"));
        assert_eq!(value(&store, "2", "name_1"), None);
    }

    #[test]
    fn test_keys_match_case_and_whitespace_insensitive() {
        let input = tables(&[
            ("a.csv", "email,name\nAlice@Example.com,Alice\n"),
            ("b.csv", "Email ,age\n  alice@example.COM ,30\n"),
        ]);
        let candidates = KeyCandidates::new(["email"]).unwrap();
        let store = merge_tables(&input, &candidates, MergePolicy::InnerJoin).unwrap();

        assert_eq!(store.len(), 1);
        let record = store.get("alice@example.com").unwrap();
        assert_eq!(record.get("email").map(String::as_str), Some("Alice@Example.com"));
        assert_eq!(record.get("age").map(String::as_str), Some("30"));
        // The later table's key column is not copied
        assert!(record.get("Email ").is_none());
    }

    #[test]
    fn test_inner_join_evicts_keys_missing_later() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n2,Bob\n3,Carol\n"),
            ("b.csv", "id,age\n1,30\n3,28\n4,99\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("2").is_none());
        assert!(store.get("4").is_none());
        assert_eq!(value(&store, "3", "age"), Some("28"));
        assert_eq!(store.evicted(), 1);
        assert_eq!(store.tables()[1].unmatched_rows, 1);
        assert_eq!(store.tables()[1].evicted_records, 1);
    }

    #[test]
    fn test_inner_join_every_table_narrows() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n2,Bob\n"),
            ("b.csv", "id,age\n1,30\n2,25\n"),
            ("c.csv", "id,city\n2,Oslo\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(value(&store, "2", "name"), Some("Bob"));
        assert_eq!(value(&store, "2", "age"), Some("25"));
        assert_eq!(value(&store, "2", "city"), Some("Oslo"));
    }

    #[test]
    fn test_inner_join_base_values_win() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n"),
            ("b.csv", "id,name,age\n1,Alicia,30\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap();

        assert_eq!(value(&store, "1", "name"), Some("Alice"));
        assert_eq!(value(&store, "1", "age"), Some("30"));
        assert_eq!(value(&store, "1", "name_1"), None);
    }

    #[test]
    fn test_empty_table_is_skipped_not_a_filter() {
        let input = tables(&[
            ("empty.csv", ""),
            ("a.csv", "id,name\n1,Alice\n"),
            ("header_only.csv", "uid,age\n"),
            ("b.csv", "id,age\n1,30\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(value(&store, "1", "age"), Some("30"));
        assert!(store.tables()[0].skipped_empty);
        assert!(store.tables()[2].skipped_empty);
        assert!(!store.tables()[1].skipped_empty);
    }

    #[test]
    fn test_short_rows_are_dropped() {
        let input = tables(&[
            ("a.csv", "name,id\nAlice,1\nBob\n"),
            ("b.csv", "id,age\n1,30\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::Accumulate).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.tables()[0].malformed_rows, 1);
    }

    #[test]
    fn test_short_row_keeps_present_cells() {
        let input = tables(&[
            ("a.csv", "id,name,age\n1,Alice\n"),
            ("b.csv", "id,city\n1,Oslo\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap();

        let record = store.get("1").unwrap();
        assert_eq!(record.get("name").map(String::as_str), Some("Alice"));
        assert!(record.get("age").is_none());
        assert_eq!(record.get("city").map(String::as_str), Some("Oslo"));
    }

    #[test]
    fn test_missing_key_column_aborts() {
        let input = tables(&[
            ("a.csv", "id,name\n1,Alice\n"),
            ("b.csv", "uid,age\n1,30\n"),
        ]);
        let err = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
    }

    #[test]
    fn test_records_keep_first_seen_order() {
        let input = tables(&[
            ("a.csv", "id,name\n3,Carol\n1,Alice\n2,Bob\n"),
            ("b.csv", "id,age\n2,25\n3,28\n1,30\n"),
        ]);
        let store = merge_tables(&input, &ids(), MergePolicy::InnerJoin).unwrap();

        let order: Vec<&str> = store.records().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(MergePolicy::InnerJoin.to_string(), "inner-join");
        assert_eq!(MergePolicy::Accumulate.to_string(), "accumulate");
        assert_eq!(MergePolicy::default(), MergePolicy::InnerJoin);
    }
}
