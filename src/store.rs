// src/store.rs
// Durable run state: the progress checkpoint and the codes already written.
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::file::ensure_directory;
use crate::hsn::RootCode;

/// Roots that are fully written to the output table.
pub type ProgressSet = BTreeSet<RootCode>;

/// JSON checkpoint of completed roots. Rewritten whole on every save.
#[derive(Clone, Debug)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Completed roots, or an empty set when there is no checkpoint.
    pub fn load(&self) -> Result<ProgressSet> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ProgressSet::new()),
            Err(e) => return Err(ExtractError::persistence(&self.path, e)),
        };
        serde_json::from_str(&text).map_err(|e| ExtractError::persistence(&self.path, e))
    }

    /// Replace the checkpoint with `done`.
    ///
    /// Written to a sibling temp file and renamed over the old one, so a
    /// crash leaves either the previous or the new checkpoint on disk.
    pub fn save(&self, done: &ProgressSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(done)
            .map_err(|e| ExtractError::persistence(&self.path, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| ExtractError::persistence(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| ExtractError::persistence(&self.path, e))?;
        debug!(path = %self.path.display(), roots = done.len(), "progress saved");
        Ok(())
    }

    /// Remove the checkpoint. A missing file is not an error.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExtractError::persistence(&self.path, e)),
        }
    }
}

/// Every `hsn_code` already present in the output table.
/// A missing or zero-byte table has no codes.
pub fn load_existing_codes(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let mut reader = csv::Reader::from_path(path).map_err(|e| ExtractError::persistence(path, e))?;
    let headers = reader.headers().map_err(|e| ExtractError::persistence(path, e))?;
    if headers.is_empty() {
        return Ok(HashSet::new());
    }
    let col = headers
        .iter()
        .position(|h| h == "hsn_code")
        .ok_or_else(|| ExtractError::persistence(path, "no hsn_code column"))?;

    let mut codes = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::persistence(path, e))?;
        if let Some(code) = record.get(col) {
            codes.insert(code.to_string());
        }
    }
    Ok(codes)
}
