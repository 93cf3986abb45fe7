//! Input path expansion
//!
//! Command-line inputs may name files or directories. A directory stands for
//! every tabular file beneath it, in sorted path order.

use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up when expanding a directory
const TABULAR_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Expand input paths into the ordered list of files to merge.
///
/// Files are kept in the order given, even if they do not exist yet (reading
/// them reports the error). Directories are walked recursively.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        if !input.is_dir() {
            files.push(input.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() && is_tabular(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();

        tracing::debug!(dir = %input.display(), files = found.len(), "expanded input directory");
        files.extend(found);
    }

    Ok(files)
}

fn is_tabular(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TABULAR_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
