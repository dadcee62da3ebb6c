use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bundlesize_core::{
    actions::ActionConsole,
    event::{ActionEnv, CiEvent},
    format::format_delta,
    run_action,
    types::{AnalysisReport, SizeRecord},
    AnalyzeOptions, ArtifactStore, BundleAnalyzer, Flow, FlowOutcome,
};

struct FakeAnalyzer {
    result: Result<Vec<SizeRecord>, String>,
    seen: RefCell<Vec<PathBuf>>,
}

impl FakeAnalyzer {
    fn with(records: Vec<SizeRecord>) -> Self {
        Self {
            result: Ok(records),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn failing(msg: &str) -> Self {
        Self {
            result: Err(msg.to_string()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl BundleAnalyzer for FakeAnalyzer {
    fn analyze(&self, root: &Path, opts: &AnalyzeOptions) -> anyhow::Result<AnalysisReport> {
        self.seen.borrow_mut().push(root.to_path_buf());
        match &self.result {
            Ok(records) => Ok(AnalysisReport {
                bundles: records.clone(),
                errors: vec![],
                gzip: opts.gzip,
                root: root.display().to_string(),
            }),
            Err(msg) => Err(anyhow::anyhow!(msg.clone())),
        }
    }
}

#[derive(Default)]
struct MemoryStore {
    artifacts: RefCell<HashMap<String, Vec<u8>>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl ArtifactStore for MemoryStore {
    fn put_artifact(&self, key: &str, bytes: &[u8]) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("upload refused");
        }
        self.artifacts
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get_artifact(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.fail_reads {
            anyhow::bail!("download exploded");
        }
        Ok(self.artifacts.borrow().get(key).cloned())
    }
}

fn flow<'a>(analyzer: &'a FakeAnalyzer, store: &'a MemoryStore) -> Flow<'a> {
    Flow {
        analyzer,
        store,
        build_path: PathBuf::from("./build/static"),
        options: AnalyzeOptions::default(),
    }
}

fn push(branch: &str) -> CiEvent {
    CiEvent::Push {
        branch: branch.to_string(),
    }
}

fn pull_request(branch: &str, target: &str) -> CiEvent {
    CiEvent::PullRequest {
        branch: branch.to_string(),
        target: target.to_string(),
    }
}

fn records(js: u64, css: u64) -> Vec<SizeRecord> {
    vec![
        SizeRecord::new("js/main.abc123.js", js),
        SizeRecord::new("css/main.def456.css", css),
    ]
}

fn output(console: ActionConsole<Vec<u8>>) -> String {
    String::from_utf8(console.into_inner()).unwrap()
}

#[test]
fn push_stores_snapshot_under_branch_name() {
    let analyzer = FakeAnalyzer::with(records(260_198, 15_000));
    let store = MemoryStore::default();
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&push("main"), &mut console);

    assert_eq!(outcome, FlowOutcome::Pushed { stored: true });
    assert_eq!(
        analyzer.seen.borrow().as_slice(),
        &[PathBuf::from("./build/static")]
    );
    let stored = store.artifacts.borrow().get("main").cloned().unwrap();
    let snapshot = AnalysisReport::from_json(&stored).unwrap();
    assert_eq!(snapshot.bundles, records(260_198, 15_000));

    let out = output(console);
    assert!(out.contains("Total bundle size: 275.2 kB"));
    assert!(out.contains("main.abc123.js (260.2 kB)"));
}

#[test]
fn push_with_zero_files_reports_error_and_uploads_nothing() {
    let analyzer = FakeAnalyzer::with(vec![]);
    let store = MemoryStore::default();
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&push("main"), &mut console);

    assert_eq!(outcome, FlowOutcome::NoFilesFound);
    assert!(!outcome.is_failure());
    assert!(store.artifacts.borrow().is_empty());
    assert!(output(console).contains("::error::Couldn't parse any assets"));
}

#[test]
fn push_upload_failure_still_reports_stats() {
    let analyzer = FakeAnalyzer::with(records(1_000, 1_000));
    let store = MemoryStore {
        fail_writes: true,
        ..MemoryStore::default()
    };
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&push("main"), &mut console);

    assert_eq!(outcome, FlowOutcome::Pushed { stored: false });
    let out = output(console);
    assert!(out.contains("::error::Couldn't save the bundle log for main: upload refused"));
    assert!(out.contains("Total bundle size: 2.0 kB"));
}

#[test]
fn analyzer_failure_aborts_flow() {
    let analyzer = FakeAnalyzer::failing("glob exploded");
    let store = MemoryStore::default();
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&pull_request("topic", "main"), &mut console);

    assert!(outcome.is_failure());
    assert!(output(console).contains("::error::Couldn't read in the bundle: glob exploded"));
}

#[test]
fn pull_request_without_baseline_reports_current_only() {
    let analyzer = FakeAnalyzer::with(records(260_198, 15_000));
    let store = MemoryStore::default();
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&pull_request("topic", "main"), &mut console);

    assert_eq!(outcome, FlowOutcome::NoBaseline);
    assert!(!console.failed());
    let out = output(console);
    assert!(out.contains("This build was 275.2 kB - couldn't find a log to check against"));
    assert!(!out.contains("represents a change"));
}

#[test]
fn pull_request_download_error_degrades_to_no_baseline() {
    let analyzer = FakeAnalyzer::with(records(1_000, 0));
    let store = MemoryStore {
        fail_reads: true,
        ..MemoryStore::default()
    };
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&pull_request("topic", "main"), &mut console);

    assert_eq!(outcome, FlowOutcome::NoBaseline);
    assert!(output(console).contains("::debug::Trying to find an artifact threw an error"));
}

#[test]
fn pull_request_with_unreadable_baseline_skips_comparison() {
    let analyzer = FakeAnalyzer::with(records(1_000, 0));
    let store = MemoryStore::default();
    store.put_artifact("main", b"<html>").unwrap();
    let mut console = ActionConsole::new(Vec::new());

    let outcome = flow(&analyzer, &store).run(&pull_request("topic", "main"), &mut console);

    assert_eq!(outcome, FlowOutcome::NoBaseline);
    assert!(output(console).contains("::warning::Ignoring unreadable bundle log for main"));
}

#[test]
fn pull_request_compares_against_target_branch_snapshot() {
    let store = MemoryStore::default();

    let base = FakeAnalyzer::with(records(250_000, 15_000));
    let mut console = ActionConsole::new(Vec::new());
    flow(&base, &store).run(&push("main"), &mut console);

    let head = FakeAnalyzer::with(records(260_198, 15_000));
    let mut console = ActionConsole::new(Vec::new());
    let outcome = flow(&head, &store).run(&pull_request("topic", "main"), &mut console);

    let cmp = match outcome {
        FlowOutcome::Compared(cmp) => cmp,
        other => panic!("expected a comparison, got {other:?}"),
    };
    assert_eq!(cmp.current_total, 275_198);
    assert_eq!(cmp.target_total, 265_000);
    assert_eq!(cmp.delta_bytes, 10_198);
    assert_eq!(cmp.delta, format_delta(275_198 - 265_000));
    assert!(output(console).contains("This pull request represents a change of 10.0 KiB"));
}

#[test]
fn pull_request_with_zero_files_still_compares() {
    let store = MemoryStore::default();
    store
        .put_artifact(
            "main",
            &AnalysisReport {
                bundles: records(2_048, 0),
                ..AnalysisReport::default()
            }
            .to_json()
            .unwrap(),
        )
        .unwrap();

    let analyzer = FakeAnalyzer::with(vec![]);
    let mut console = ActionConsole::new(Vec::new());
    let outcome = flow(&analyzer, &store).run(&pull_request("topic", "main"), &mut console);

    let cmp = match outcome {
        FlowOutcome::Compared(cmp) => cmp,
        other => panic!("expected a comparison, got {other:?}"),
    };
    assert_eq!(cmp.delta, "-2.0 KiB");
    assert!(output(console).contains("::error::Couldn't parse any assets"));
}

#[test]
fn run_action_skips_unhandled_events() {
    let analyzer = FakeAnalyzer::with(records(1, 1));
    let store = MemoryStore::default();
    let mut console = ActionConsole::new(Vec::new());
    let env = ActionEnv {
        event_name: Some("workflow_dispatch".to_string()),
        git_ref: Some("refs/heads/main".to_string()),
        ..ActionEnv::default()
    };

    let outcome = run_action(&env, &flow(&analyzer, &store), &mut console);

    assert_eq!(outcome, FlowOutcome::Skipped);
    assert!(analyzer.seen.borrow().is_empty());
}

#[test]
fn run_action_fails_job_without_ref() {
    let analyzer = FakeAnalyzer::with(records(1, 1));
    let store = MemoryStore::default();
    let mut console = ActionConsole::new(Vec::new());
    let env = ActionEnv {
        event_name: Some("push".to_string()),
        ..ActionEnv::default()
    };

    let outcome = run_action(&env, &flow(&analyzer, &store), &mut console);

    assert!(outcome.is_failure());
    assert!(console.failed());
    assert!(analyzer.seen.borrow().is_empty());
    assert!(output(console).contains("::error::the branch could not be detected"));
}

#[test]
fn outputs_are_written_for_comparisons() {
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("github_output");
    let summary_file = dir.path().join("summary.md");

    let store = MemoryStore::default();
    let base = FakeAnalyzer::with(records(1_000, 0));
    flow(&base, &store).run(&push("main"), &mut ActionConsole::new(Vec::new()));

    let head = FakeAnalyzer::with(records(3_048, 0));
    let mut console = ActionConsole::new(Vec::new())
        .with_output_file(Some(output_file.clone()))
        .with_summary_file(Some(summary_file.clone()));
    flow(&head, &store).run(&pull_request("topic", "main"), &mut console);

    let outputs = std::fs::read_to_string(output_file).unwrap();
    assert_eq!(
        outputs,
        "total-bytes=3048\ntotal-size=3.0 kB\ndelta-bytes=2048\ndelta=2.0 KiB\n"
    );
    let summary = std::fs::read_to_string(summary_file).unwrap();
    assert!(summary.contains("- delta: `2.0 KiB`"));
}
