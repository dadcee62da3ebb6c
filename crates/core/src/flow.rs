use std::{io::Write, path::PathBuf};

use crate::{
    actions::ActionConsole,
    analyzer::{AnalyzeOptions, BundleAnalyzer},
    artifact::ArtifactStore,
    event::{ActionEnv, CiEvent},
    report::{comparison_line, no_baseline_line, to_markdown, Reporter},
    stats::{compare, create_stats, BundleStats, Comparison},
    types::AnalysisReport,
};

pub const DEFAULT_BUILD_PATH: &str = "./build/static";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The event is neither a push nor a pull request.
    Skipped,
    /// Push finished; `stored` is false when the artifact upload failed.
    Pushed { stored: bool },
    NoFilesFound,
    Compared(Comparison),
    NoBaseline,
    Aborted(String),
}

impl FlowOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FlowOutcome::Aborted(_))
    }
}

pub struct Flow<'a> {
    pub analyzer: &'a dyn BundleAnalyzer,
    pub store: &'a dyn ArtifactStore,
    pub build_path: PathBuf,
    pub options: AnalyzeOptions,
}

/// Resolve the event from `env` and run the matching flow.
pub fn run_action<W: Write>(
    env: &ActionEnv,
    flow: &Flow<'_>,
    console: &mut ActionConsole<W>,
) -> FlowOutcome {
    match CiEvent::resolve(env) {
        Ok(Some(event)) => flow.run(&event, console),
        Ok(None) => {
            console.debug(&format!(
                "nothing to do for event {:?}",
                env.event_name.as_deref().unwrap_or("")
            ));
            FlowOutcome::Skipped
        }
        Err(e) => {
            let msg = e.to_string();
            console.set_failed(&msg);
            FlowOutcome::Aborted(msg)
        }
    }
}

impl Flow<'_> {
    pub fn run<W: Write>(&self, event: &CiEvent, console: &mut ActionConsole<W>) -> FlowOutcome {
        let res = match event {
            CiEvent::Push { branch } => {
                console.info("👷 Push event detected, logging bundle results to console!");
                self.push(branch, console)
            }
            CiEvent::PullRequest { branch, target } => {
                console.info(
                    "👌 Pull Request event detected, comparing bundle results against the target branch!",
                );
                self.pull_request(branch, target, console)
            }
        };

        match res {
            Ok(outcome) => outcome,
            Err(e) => {
                let msg = format!("{e:#}");
                console.set_failed(&msg);
                FlowOutcome::Aborted(msg)
            }
        }
    }

    fn push<W: Write>(
        &self,
        branch: &str,
        console: &mut ActionConsole<W>,
    ) -> anyhow::Result<FlowOutcome> {
        let report = match self.analyze(console) {
            Ok(report) => report,
            Err(outcome) => return Ok(outcome),
        };

        if report.is_empty() {
            console.error("Couldn't parse any assets from the build, or build wasn't found..");
            return Ok(FlowOutcome::NoFilesFound);
        }

        let stats = create_stats(&report.bundles);
        let bytes = report.to_json()?;

        let stored = match self.store.put_artifact(branch, &bytes) {
            Ok(()) => {
                console.debug(&format!(
                    "⭐ A bundle log for this build has been saved under branch {branch}"
                ));
                true
            }
            Err(e) => {
                console.error(&format!("Couldn't save the bundle log for {branch}: {e:#}"));
                false
            }
        };

        Reporter::new(console).report(&stats);
        publish(console, &stats, None);

        Ok(FlowOutcome::Pushed { stored })
    }

    fn pull_request<W: Write>(
        &self,
        branch: &str,
        target: &str,
        console: &mut ActionConsole<W>,
    ) -> anyhow::Result<FlowOutcome> {
        console.debug(&format!("comparing {branch} against {target}"));

        let report = match self.analyze(console) {
            Ok(report) => report,
            Err(outcome) => return Ok(outcome),
        };

        if report.is_empty() {
            console.error("Couldn't parse any assets from the build, or build wasn't found..");
        }

        let current = create_stats(&report.bundles);
        Reporter::new(console).report(&current);

        let Some(target_stats) = self.baseline(target, console) else {
            console.debug("♻️ Set the bundle size without specifying what it was against!");
            console.info(&no_baseline_line(&current));
            publish(console, &current, None);
            return Ok(FlowOutcome::NoBaseline);
        };

        let cmp = compare(&current, &target_stats);
        console.info(&comparison_line(&cmp));
        publish(console, &current, Some(&cmp));

        Ok(FlowOutcome::Compared(cmp))
    }

    fn analyze<W: Write>(
        &self,
        console: &mut ActionConsole<W>,
    ) -> Result<AnalysisReport, FlowOutcome> {
        console.debug(&format!("Read in the following path: {:?}", self.build_path));

        match self.analyzer.analyze(&self.build_path, &self.options) {
            Ok(report) => {
                for err in &report.errors {
                    console.warning(&format!("{}: {}", err.file_name, err.message));
                }
                Ok(report)
            }
            Err(e) => {
                let msg = format!("Couldn't read in the bundle: {e:#}");
                console.error(&msg);
                Err(FlowOutcome::Aborted(msg))
            }
        }
    }

    /// Stats stored for `target`, or `None` when no usable artifact exists.
    fn baseline<W: Write>(
        &self,
        target: &str,
        console: &mut ActionConsole<W>,
    ) -> Option<BundleStats> {
        let bytes = match self.store.get_artifact(target) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                console.info(&format!(
                    "No bundle log found for {target}, it may never have been built"
                ));
                return None;
            }
            Err(e) => {
                console.debug(&format!("Trying to find an artifact threw an error: {e:#}"));
                return None;
            }
        };

        match AnalysisReport::from_json(&bytes) {
            Ok(report) => Some(create_stats(&report.bundles)),
            Err(e) => {
                console.warning(&format!("Ignoring unreadable bundle log for {target}: {e:#}"));
                None
            }
        }
    }
}

fn publish<W: Write>(
    console: &mut ActionConsole<W>,
    stats: &BundleStats,
    cmp: Option<&Comparison>,
) {
    console.set_output("total-bytes", &stats.total_bytes_number.to_string());
    console.set_output("total-size", &stats.total_bytes);
    if let Some(cmp) = cmp {
        console.set_output("delta-bytes", &cmp.delta_bytes.to_string());
        console.set_output("delta", &cmp.delta);
    }
    console.append_summary(&to_markdown(stats, cmp));
}
