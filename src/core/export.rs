use crate::core::formats::{serialize_records, DataFormat};
use crate::core::{Record, Storage};
use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_SUFFIX: &str = "-output";

/// `{dir}/{stem}{suffix}.{ext}` next to `source`.
pub fn output_path_for(source: &str, suffix: &str, format: DataFormat) -> String {
    let path = Path::new(source);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records".to_string());
    let file_name = format!("{}{}.{}", stem, suffix, format.extension());

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.join(file_name).to_string_lossy().into_owned()
        }
        _ => file_name,
    }
}

/// Default store location for a file import: `{dir}/{stem}.db`, or
/// `{dir}/{stem}.geocode.db` when the input itself already ends in `.db`.
pub fn store_path_for(source: &str) -> PathBuf {
    let source = Path::new(source);
    let store = source.with_extension("db");
    if store == source {
        source.with_extension("geocode.db")
    } else {
        store
    }
}

/// Writes the final dataset through a [`Storage`] backend.
pub struct Exporter<S: Storage> {
    storage: S,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Serializes `records` (ids stripped) and writes them to `path`.
    /// Any failure is an [`EtlError::ExportError`].
    pub async fn export(&self, records: &[Record], format: DataFormat, path: &str) -> Result<String> {
        let stripped: Vec<Record> = records.iter().cloned().map(Record::without_id).collect();

        let bytes = serialize_records(&stripped, format).map_err(|e| EtlError::ExportError {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Writing {} records ({} bytes) to {}", stripped.len(), bytes.len(), path);

        self.storage
            .write_file(path, &bytes)
            .await
            .map_err(|e| EtlError::ExportError {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        Ok(path.to_string())
    }
}
