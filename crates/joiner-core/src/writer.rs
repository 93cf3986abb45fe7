//! CSV writer for the projected output

use crate::error::{Error, Result};
use crate::projector::Projection;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a projection to `path`, header first
pub fn write_csv<P: AsRef<Path>>(path: P, projection: &Projection, delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::OutputCreate {
        path: path.to_path_buf(),
        source: e,
    })?;

    write_to(BufWriter::new(file), projection, delimiter).map_err(|e| Error::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), rows = projection.row_count(), "wrote output");
    Ok(())
}

/// Write a projection to any writer
pub fn write_to<W: Write>(
    writer: W,
    projection: &Projection,
    delimiter: u8,
) -> std::result::Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_writer(writer);

    // Nothing survived: leave the file empty rather than writing a blank record
    if projection.headers.is_empty() {
        csv_writer.flush()?;
        return Ok(());
    }

    csv_writer.write_record(&projection.headers)?;
    for row in &projection.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
