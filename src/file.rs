// src/file.rs

use std::{
    fs::{self, OpenOptions},
    path::Path,
};

use serde::Serialize;

use crate::error::{ExtractError, Result};

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(ExtractError::persistence(dir, "path exists but is not a directory"));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| ExtractError::persistence(dir, e))?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

/// Create `path` with just a header line, unless it already holds data.
/// A non-empty table is never truncated; a zero-byte one gets its header.
pub fn init_table(path: &Path, headers: &[&str]) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => return Ok(()),
        _ => {}
    }
    ensure_parent(path)?;
    let mut out = csv::Writer::from_path(path).map_err(|e| ExtractError::persistence(path, e))?;
    out.write_record(headers).map_err(|e| ExtractError::persistence(path, e))?;
    out.flush().map_err(|e| ExtractError::persistence(path, e))?;
    Ok(())
}

/// Append rows to an existing table (header already written).
/// The file is opened for this batch only and closed on return.
pub fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| ExtractError::persistence(path, e))?;
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for row in rows {
        out.serialize(row).map_err(|e| ExtractError::persistence(path, e))?;
    }
    out.flush().map_err(|e| ExtractError::persistence(path, e))?;
    Ok(())
}

/// Create/truncate `path` and write `rows` with a header taken from `T`.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut out = csv::Writer::from_path(path).map_err(|e| ExtractError::persistence(path, e))?;
    for row in rows {
        out.serialize(row).map_err(|e| ExtractError::persistence(path, e))?;
    }
    out.flush().map_err(|e| ExtractError::persistence(path, e))?;
    Ok(())
}
