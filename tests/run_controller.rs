// tests/run_controller.rs
//
// Drives the HSN run controller with a scripted fetcher against temp dirs.
//
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use zimra_extract::core::{ClassificationRecord, Fetch};
use zimra_extract::error::{ExtractError, Result};
use zimra_extract::hsn::RootCode;
use zimra_extract::progress::Progress;
use zimra_extract::runner::RootState;
use zimra_extract::store::{ProgressSet, ProgressStore};
use zimra_extract::{ExtractorConfig, RunController};

#[derive(Default)]
struct Scripted {
    records: HashMap<u8, Vec<ClassificationRecord>>,
    fail_at: Option<u8>,
    malformed_at: Option<u8>,
    calls: RefCell<Vec<String>>,
}

impl Scripted {
    fn with(mut self, root: u8, recs: &[(&str, &str)]) -> Self {
        let recs = recs.iter().map(|(c, d)| ClassificationRecord::new(c, d)).collect();
        self.records.insert(root, recs);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Fetch for Scripted {
    fn fetch(&self, root: RootCode) -> Result<Vec<ClassificationRecord>> {
        self.calls.borrow_mut().push(root.to_string());
        if self.fail_at == Some(root.get()) {
            return Err(ExtractError::Transport { root: root.to_string(), reason: "503 Service Unavailable".into() });
        }
        if self.malformed_at == Some(root.get()) {
            return Err(ExtractError::MalformedResponse { root: root.to_string(), reason: "expected object".into() });
        }
        Ok(self.records.get(&root.get()).cloned().unwrap_or_default())
    }
}

fn config(dir: &TempDir, roots: std::ops::RangeInclusive<u8>) -> ExtractorConfig {
    let mut cfg = ExtractorConfig::new("http://unused.invalid", "Bearer t", "20260101T00:00", 1, 716);
    cfg.progress_path = dir.path().join("progress.json");
    cfg.output_dir = dir.path().join("data");
    cfg.request_delay = Duration::ZERO;
    cfg.roots = roots;
    cfg
}

fn roots(ns: impl IntoIterator<Item = u8>) -> ProgressSet {
    ns.into_iter().map(|n| RootCode::new(n).unwrap()).collect()
}

fn output_rows(path: &Path) -> Vec<(String, String)> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, ["hsn_code", "description"]);
    rdr.records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string())
        })
        .collect()
}

#[test]
fn resume_processes_only_pending_roots() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 1..=3);
    ProgressStore::new(&cfg.progress_path).save(&roots([1, 2])).unwrap();

    let fetcher = Scripted::default().with(3, &[("03", "Live poultry"), ("0301", "Ornamental fish")]);
    let controller = RunController::new(cfg, &fetcher).unwrap();
    let summary = controller.run(None).unwrap();

    assert_eq!(fetcher.calls(), vec!["03"]);
    assert_eq!(summary.completed, roots([1, 2, 3]));
    assert_eq!(summary.rows_added, 2);
    assert_eq!(summary.state_of(RootCode::new(1).unwrap()), RootState::Skipped);
    assert_eq!(summary.state_of(RootCode::new(3).unwrap()), RootState::Persisted);

    // Only 3 of 99 roots done: the checkpoint stays.
    assert!(!summary.progress_deleted);
    assert_eq!(controller.progress_store().load().unwrap(), roots([1, 2, 3]));
}

#[test]
fn failure_stops_run_and_keeps_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 1..=99);
    ProgressStore::new(&cfg.progress_path).save(&roots(1..=4)).unwrap();

    let fetcher = Scripted { fail_at: Some(5), ..Default::default() }.with(6, &[("06", "Live trees")]);
    let controller = RunController::new(cfg, &fetcher).unwrap();
    let summary = controller.run(None).unwrap();

    assert_eq!(fetcher.calls(), vec!["05"]);
    let failure = summary.failure.as_ref().unwrap();
    assert_eq!(failure.root.to_string(), "05");
    assert!(matches!(failure.error, ExtractError::Transport { .. }));

    assert_eq!(summary.completed, roots(1..=4));
    assert_eq!(summary.state_of(RootCode::new(5).unwrap()), RootState::Failed);
    assert_eq!(summary.state_of(RootCode::new(6).unwrap()), RootState::Pending);
    assert!(!summary.progress_deleted);
    assert!(controller.progress_store().exists());
    assert_eq!(controller.progress_store().load().unwrap(), roots(1..=4));
    assert!(output_rows(controller.output_path()).is_empty());
}

#[test]
fn malformed_payload_is_a_root_failure() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Scripted { malformed_at: Some(2), ..Default::default() }.with(1, &[("01", "Live animals")]);
    let controller = RunController::new(config(&dir, 1..=3), &fetcher).unwrap();
    let summary = controller.run(None).unwrap();

    assert_eq!(fetcher.calls(), vec!["01", "02"]);
    assert!(matches!(
        summary.failure.as_ref().map(|f| &f.error),
        Some(ExtractError::MalformedResponse { .. })
    ));
    assert_eq!(summary.completed, roots([1]));
    assert_eq!(output_rows(controller.output_path()), vec![("01".into(), "LIVE ANIMALS".into())]);
}

#[test]
fn full_success_deletes_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Scripted::default()
        .with(1, &[("01", "Live animals"), ("0101", "Horses"), ("010190", "Other")])
        .with(99, &[("99", "Special provisions")]);
    let controller = RunController::new(config(&dir, 1..=99), &fetcher).unwrap();
    let summary = controller.run(None).unwrap();

    assert_eq!(fetcher.calls().len(), 99);
    assert!(summary.failure.is_none());
    assert!(summary.is_complete());
    assert!(summary.progress_deleted);
    assert!(!controller.progress_store().exists());
    assert_eq!(
        output_rows(controller.output_path()),
        vec![
            ("01".into(), "LIVE ANIMALS".into()),
            ("0101".into(), "HORSES".into()),
            ("010190".into(), "OTHER \u{2013} HORSES".into()),
            ("99".into(), "SPECIAL PROVISIONS".into()),
        ]
    );
}

#[test]
fn second_full_run_adds_no_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Scripted::default()
        .with(1, &[("01", "Live animals"), ("0101", "Horses")])
        .with(2, &[("02", "Meat"), ("0201", "Of bovine animals")]);

    let first = RunController::new(config(&dir, 1..=99), &fetcher).unwrap();
    let s1 = first.run(None).unwrap();
    let rows_once = output_rows(first.output_path());

    let second = RunController::new(config(&dir, 1..=99), &fetcher).unwrap();
    let s2 = second.run(None).unwrap();
    let rows_twice = output_rows(second.output_path());

    assert_eq!(s1.rows_added, 4);
    assert_eq!(s2.rows_added, 0);
    assert_eq!(rows_once, rows_twice);
    assert_eq!(rows_twice[3], ("0201".into(), "OF BOVINE ANIMALS \u{2013} MEAT".into()));

    let codes: BTreeSet<_> = rows_twice.iter().map(|(c, _)| c.clone()).collect();
    assert_eq!(codes.len(), rows_twice.len());
}

#[test]
fn rerun_after_failure_resumes_at_failed_root() {
    let dir = tempfile::tempdir().unwrap();
    let broken = Scripted { fail_at: Some(3), ..Default::default() }
        .with(1, &[("01", "Live animals")])
        .with(2, &[("02", "Meat")]);
    let s1 = RunController::new(config(&dir, 1..=4), &broken).unwrap().run(None).unwrap();
    assert_eq!(s1.completed, roots([1, 2]));

    let healthy = Scripted::default()
        .with(1, &[("01", "Live animals")])
        .with(3, &[("03", "Fish")])
        .with(4, &[("04", "Dairy produce")]);
    let controller = RunController::new(config(&dir, 1..=4), &healthy).unwrap();
    let s2 = controller.run(None).unwrap();

    assert_eq!(healthy.calls(), vec!["03", "04"]);
    assert_eq!(s2.completed, roots(1..=4));
    let codes: Vec<_> = output_rows(controller.output_path()).into_iter().map(|(c, _)| c).collect();
    assert_eq!(codes, vec!["01", "02", "03", "04"]);
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl Progress for Recorder {
    fn begin(&mut self, total: usize) {
        self.events.push(format!("begin {total}"));
    }
    fn log(&mut self, msg: &str) {
        self.events.push(msg.to_string());
    }
    fn item_skipped(&mut self, root: RootCode) {
        self.events.push(format!("skip {root}"));
    }
    fn item_done(&mut self, root: RootCode, added: usize) {
        self.events.push(format!("done {root} +{added}"));
    }
    fn item_failed(&mut self, root: RootCode, _err: &ExtractError) {
        self.events.push(format!("fail {root}"));
    }
    fn finish(&mut self) {
        self.events.push("finish".into());
    }
}

#[test]
fn progress_hook_sees_each_transition() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 1..=4);
    ProgressStore::new(&cfg.progress_path).save(&roots([1])).unwrap();

    let fetcher = Scripted { fail_at: Some(3), ..Default::default() }.with(2, &[("02", "Meat"), ("0201", "Fresh")]);
    let mut rec = Recorder::default();
    RunController::new(cfg, &fetcher).unwrap().run(Some(&mut rec)).unwrap();

    assert_eq!(
        rec.events,
        vec![
            "begin 4",
            "skip 01",
            "Processing root code 02",
            "Root 02: 2 new records",
            "done 02 +2",
            "Processing root code 03",
            "fail 03",
            "finish",
        ]
    );
}

#[test]
fn existing_output_seeds_dedupe() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 1..=1);
    let out = cfg.output_path().unwrap();
    fs::create_dir_all(out.parent().unwrap()).unwrap();
    fs::write(&out, "hsn_code,description\n0101,HORSES FROM AN EARLIER RUN\n").unwrap();

    let fetcher = Scripted::default().with(1, &[("01", "Live animals"), ("0101", "Horses")]);
    let summary = RunController::new(cfg, &fetcher).unwrap().run(None).unwrap();

    assert_eq!(summary.rows_added, 1);
    assert_eq!(
        output_rows(&out),
        vec![
            ("0101".into(), "HORSES FROM AN EARLIER RUN".into()),
            ("01".into(), "LIVE ANIMALS".into()),
        ]
    );
}

#[test]
fn zero_byte_output_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 1..=1);
    let out = cfg.output_path().unwrap();
    fs::create_dir_all(out.parent().unwrap()).unwrap();
    fs::write(&out, "").unwrap();

    let fetcher = Scripted::default().with(1, &[("01", "Live animals")]);
    let summary = RunController::new(cfg, &fetcher).unwrap().run(None).unwrap();

    assert_eq!(fetcher.calls(), vec!["01"]);
    assert_eq!(summary.completed, roots([1]));
    assert_eq!(output_rows(&out), vec![("01".into(), "LIVE ANIMALS".into())]);
}

#[test]
fn delay_follows_persisted_roots_only() {
    let delay = Duration::from_millis(300);
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir, 1..=3);
    cfg.request_delay = delay;
    ProgressStore::new(&cfg.progress_path).save(&roots([1, 2])).unwrap();

    let fetcher = Scripted::default().with(3, &[("03", "Fish")]);
    let controller = RunController::new(cfg, &fetcher).unwrap();
    let started = Instant::now();
    let summary = controller.run(None).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summary.completed, roots(1..=3));
    // One persisted root: one pause. Skipped roots add none.
    assert!(elapsed >= delay, "no pause after persisted root: {elapsed:?}");
    assert!(elapsed < delay * 2, "skipped roots were throttled: {elapsed:?}");
}

#[test]
fn all_skipped_run_does_not_pause() {
    let delay = Duration::from_millis(300);
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir, 1..=3);
    cfg.request_delay = delay;
    ProgressStore::new(&cfg.progress_path).save(&roots(1..=3)).unwrap();

    let fetcher = Scripted::default();
    let started = Instant::now();
    RunController::new(cfg, &fetcher).unwrap().run(None).unwrap();

    assert!(fetcher.calls().is_empty());
    assert!(started.elapsed() < delay);
}
