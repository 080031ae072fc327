use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::records::Tabular;

/// Writes `rows` as a semicolon-separated CSV stored in a single deflated
/// entry named `entry_name` inside the zip archive at `path`.
///
/// The header row is always written, even when `rows` is empty.
pub fn write_csv_zip<T: Tabular>(path: &Path, entry_name: &str, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), entry_name, rows = rows.len(), "Writing CSV archive");

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file(entry_name, options)?;

    {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false) // header comes from T::COLUMNS
            .from_writer(&mut archive);

        writer.write_record(T::COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    archive
        .finish()
        .with_context(|| format!("finishing {}", path.display()))?;
    Ok(())
}
