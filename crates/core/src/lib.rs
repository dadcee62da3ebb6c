pub mod actions;
pub mod analyzer;
pub mod artifact;
pub mod config;
pub mod event;
pub mod flow;
pub mod format;
pub mod refs;
pub mod report;
pub mod stats;
pub mod types;

pub use analyzer::{AnalyzeOptions, BundleAnalyzer, FsAnalyzer};
pub use artifact::{ArtifactStore, DirArtifactStore};
pub use flow::{run_action, Flow, FlowOutcome};
pub use stats::{create_stats, BundleStats};
