// src/runner.rs
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, error, info, warn};

use crate::{
    config::{consts::HSN_HEADERS, ExtractorConfig},
    core::net::{ClassificationRecord, Fetch},
    core::sanitize::normalize_description,
    error::{ExtractError, Result},
    file::{append_rows, init_table},
    hsn::{enrich, OutputRow, ParentMap, RootCode},
    progress::Progress,
    store::{load_existing_codes, ProgressSet, ProgressStore},
};

/// Where a root ended up in this run.
///
/// `Pending → Skipped`, or `Pending → Fetching → Processing → Persisted`,
/// or `Pending → Fetching → Failed` (processing/persist errors also land
/// in `Failed`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootState {
    Pending,
    Skipped,
    Fetching,
    Processing,
    Persisted,
    Failed,
}

impl fmt::Display for RootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootState::Pending => "pending",
            RootState::Skipped => "skipped",
            RootState::Fetching => "fetching",
            RootState::Processing => "processing",
            RootState::Persisted => "persisted",
            RootState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootOutcome {
    pub root: RootCode,
    pub state: RootState,
    /// New rows written for this root (0 unless persisted).
    pub added: usize,
}

#[derive(Debug)]
pub struct RootFailure {
    pub root: RootCode,
    pub error: ExtractError,
}

/// What one invocation did.
#[derive(Debug)]
pub struct RunSummary {
    /// Roots visited this run, in order. Roots after a failure are absent.
    pub outcomes: Vec<RootOutcome>,
    /// Checkpoint contents at the end of the run.
    pub completed: ProgressSet,
    pub rows_added: usize,
    pub failure: Option<RootFailure>,
    /// The checkpoint was removed because every root is done.
    pub progress_deleted: bool,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && RootCode::all().all(|r| self.completed.contains(&r))
    }

    pub fn state_of(&self, root: RootCode) -> RootState {
        self.outcomes
            .iter()
            .find(|o| o.root == root)
            .map_or(RootState::Pending, |o| o.state)
    }
}

/// Mutable state threaded through one run. Never outlives it.
struct RunState {
    completed: ProgressSet,
    existing_codes: HashSet<String>,
    parent_map: ParentMap,
}

/// Drives roots in order: skip completed, fetch, normalize + enrich,
/// dedupe, append, checkpoint. Stops at the first failed root.
pub struct RunController<F> {
    config: ExtractorConfig,
    fetcher: F,
    progress_store: ProgressStore,
    output_path: PathBuf,
}

impl<F: Fetch> RunController<F> {
    pub fn new(config: ExtractorConfig, fetcher: F) -> Result<Self> {
        let output_path = config.output_path()?;
        let progress_store = ProgressStore::new(&config.progress_path);
        Ok(Self { config, fetcher, progress_store, output_path })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress_store
    }

    /// Run every root in the configured range once.
    ///
    /// A failed root is reported in the summary, not as `Err`; `Err` means the
    /// run could not start (output/checkpoint unreadable) or could not clean up.
    pub fn run(&self, mut progress: Option<&mut dyn Progress>) -> Result<RunSummary> {
        init_table(&self.output_path, &HSN_HEADERS)?;

        let mut state = RunState {
            completed: self.progress_store.load()?,
            existing_codes: load_existing_codes(&self.output_path)?,
            parent_map: ParentMap::new(),
        };

        info!("Starting ZIMRA HSN extraction for {}", self.config.simulation_day()?);
        info!("Already completed roots: {}", state.completed.len());
        info!("Existing codes in CSV: {}", state.existing_codes.len());

        let roots: Vec<RootCode> = self.config.roots.clone().filter_map(RootCode::new).collect();
        if let Some(p) = progress.as_deref_mut() {
            p.begin(roots.len());
        }

        let mut outcomes = Vec::with_capacity(roots.len());
        let mut rows_added = 0;
        let mut failure = None;

        for root in roots {
            if state.completed.contains(&root) {
                info!("Skipping root {root} (already processed)");
                outcomes.push(RootOutcome { root, state: RootState::Skipped, added: 0 });
                if let Some(p) = progress.as_deref_mut() {
                    p.item_skipped(root);
                }
                continue;
            }

            info!("Processing root code {root}");
            if let Some(p) = progress.as_deref_mut() {
                p.log(&format!("Processing root code {root}"));
            }
            match self.attempt_root(root, &mut state) {
                Ok(added) => {
                    rows_added += added;
                    outcomes.push(RootOutcome { root, state: RootState::Persisted, added });
                    if let Some(p) = progress.as_deref_mut() {
                        p.log(&format!("Root {root}: {added} new records"));
                        p.item_done(root, added);
                    }
                    thread::sleep(self.config.request_delay);
                }
                Err(e) => {
                    error!("FAILED at root {root}: {e}");
                    outcomes.push(RootOutcome { root, state: RootState::Failed, added: 0 });
                    if let Some(p) = progress.as_deref_mut() {
                        p.item_failed(root, &e);
                    }
                    failure = Some(RootFailure { root, error: e });
                    break;
                }
            }
        }

        let mut summary = RunSummary {
            outcomes,
            completed: state.completed,
            rows_added,
            failure,
            progress_deleted: false,
        };

        if summary.is_complete() {
            self.progress_store.delete()?;
            summary.progress_deleted = true;
            info!("All roots processed successfully");
            info!("Progress file deleted");
        } else {
            warn!("Run did not complete fully; progress file retained");
        }
        info!("ZIMRA HSN extraction finished");

        if let Some(p) = progress.as_deref_mut() {
            p.finish();
        }
        Ok(summary)
    }

    /// Fetch, process and persist one root. The checkpoint only grows after
    /// the root's rows are on disk.
    fn attempt_root(&self, root: RootCode, state: &mut RunState) -> Result<usize> {
        advance(root, RootState::Pending, RootState::Fetching);
        let records = self.fetcher.fetch(root)?;
        info!("{root}: fetched {} records", records.len());

        advance(root, RootState::Fetching, RootState::Processing);
        let batch = process_records(records, &mut state.parent_map, &mut state.existing_codes);

        append_rows(&self.output_path, &batch)?;
        if batch.is_empty() {
            info!("{root}: no new records");
        } else {
            info!("{root}: added {} new records", batch.len());
        }

        let mut next = state.completed.clone();
        next.insert(root);
        self.progress_store.save(&next)?;
        state.completed = next;
        advance(root, RootState::Processing, RootState::Persisted);

        Ok(batch.len())
    }
}

fn advance(root: RootCode, from: RootState, to: RootState) {
    debug!(%root, "{from} -> {to}");
}

/// Turn one root's raw records into the rows not yet in the output.
///
/// Every usable record feeds `parent_map` (even duplicates), before its own
/// enrichment, so later records in the same batch can use it. Codes are
/// claimed in `existing_codes` as soon as they are batched.
pub fn process_records(
    records: Vec<ClassificationRecord>,
    parent_map: &mut ParentMap,
    existing_codes: &mut HashSet<String>,
) -> Vec<OutputRow> {
    let mut batch = Vec::new();
    for record in records {
        let (Some(code), Some(raw)) = (record.code, record.description) else {
            continue;
        };
        if code.is_empty() || raw.is_empty() {
            continue;
        }

        let desc = normalize_description(&raw);
        parent_map.insert(code.clone(), desc.clone());
        let description = enrich(desc, &code, parent_map);

        if existing_codes.insert(code.clone()) {
            batch.push(OutputRow { hsn_code: code, description });
        }
    }
    batch
}
