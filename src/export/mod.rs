//! JSON import/export of the full record set
//!
//! The document is a JSON array of records in identifier order:
//!
//! ```json
//! [{"identifier": 101, "title": "Clean Code", "author": "Robert C. Martin", "year": 2008, "copies": 4}]
//! ```
//!
//! Reading is lenient per record: each array element is decoded on its own,
//! so one bad element yields a `MalformedRecord` at its position without
//! failing the document. A document that is not a JSON array fails as a
//! whole.

mod errors;

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::{BulkReport, CatalogError, CatalogResult, CatalogStore, Record, RecordDraft};

pub use errors::{ExportError, ExportResult};

/// Writes every record in identifier order. Returns the record count.
pub fn write_catalog<W: Write>(
    store: &CatalogStore,
    mut writer: W,
    pretty: bool,
) -> ExportResult<usize> {
    let records = store.list_by_id();
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &records)?;
    } else {
        serde_json::to_writer(&mut writer, &records)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(records.len())
}

/// Decodes a catalog document into per-record results, in input order
pub fn read_catalog<R: Read>(reader: R) -> ExportResult<Vec<CatalogResult<Record>>> {
    let values: Vec<Value> = serde_json::from_reader(reader)?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(position, value)| decode_record(position, value))
        .collect())
}

fn decode_record(position: usize, value: Value) -> CatalogResult<Record> {
    let malformed = |reason: String| CatalogError::MalformedRecord { position, reason };

    let draft: RecordDraft =
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
    draft.into_record().map_err(|e| malformed(e.to_string()))
}

/// Writes the catalog to `path`, replacing the file only once fully written.
///
/// The staging file sits next to `path` as `<file name>.tmp` and is removed
/// if any step fails.
pub fn save_to_path(store: &CatalogStore, path: &Path, pretty: bool) -> ExportResult<usize> {
    let staging = staging_path(path)?;

    match write_staged(store, &staging, path, pretty) {
        Ok(count) => {
            info!(path = %path.display(), records = count, "catalog saved");
            Ok(count)
        }
        Err(e) => {
            let _ = fs::remove_file(&staging);
            Err(e)
        }
    }
}

fn staging_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} does not name a file", path.display()),
        )
    })?;

    let mut staged = file_name.to_os_string();
    staged.push(".tmp");
    Ok(path.with_file_name(staged))
}

fn write_staged(
    store: &CatalogStore,
    staging: &Path,
    path: &Path,
    pretty: bool,
) -> ExportResult<usize> {
    let file = File::create(staging)?;
    let mut writer = BufWriter::new(file);
    let count = write_catalog(store, &mut writer, pretty)?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(staging, path)?;
    Ok(count)
}

/// Replaces the store's contents with the document at `path`
pub fn load_from_path(store: &mut CatalogStore, path: &Path) -> ExportResult<BulkReport> {
    let file = File::open(path)?;
    let entries = read_catalog(BufReader::new(file))?;
    debug!(path = %path.display(), entries = entries.len(), "catalog document read");

    let report = store.bulk_load(entries);
    info!(
        path = %path.display(),
        applied = report.applied,
        rejected = report.rejected.len(),
        "catalog loaded"
    );
    Ok(report)
}
