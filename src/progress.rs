// src/progress.rs
use crate::error::ExtractError;
use crate::hsn::RootCode;

/// Lightweight progress reporting for a run over classification roots.
/// Frontends implement this to surface status; every method defaults to a no-op.
pub trait Progress {
    /// Called at the start with the number of roots in range.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Root was already in the checkpoint; nothing fetched.
    fn item_skipped(&mut self, _root: RootCode) {}

    /// Root persisted with `added` new rows.
    fn item_done(&mut self, _root: RootCode, _added: usize) {}

    /// Root failed; the run stops after this.
    fn item_failed(&mut self, _root: RootCode, _err: &ExtractError) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}
