mod measure;

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use walkdir::WalkDir;

use crate::types::{AnalysisError, AnalysisReport, SizeRecord};

pub use measure::measure;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// File extensions to include, without the leading dot.
    pub extensions: Vec<String>,
    pub gzip: bool,
    pub max_total_bytes_scanned: u64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["js".to_string(), "css".to_string()],
            gzip: true,
            max_total_bytes_scanned: 512 * 1024 * 1024,
        }
    }
}

/// Produces per-file size records for a build output directory.
pub trait BundleAnalyzer {
    fn analyze(&self, root: &Path, opts: &AnalyzeOptions) -> anyhow::Result<AnalysisReport>;
}

/// Scans the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAnalyzer;

impl BundleAnalyzer for FsAnalyzer {
    fn analyze(&self, root: &Path, opts: &AnalyzeOptions) -> anyhow::Result<AnalysisReport> {
        scan_build_dir(root, opts)
    }
}

pub fn scan_build_dir(root: &Path, opts: &AnalyzeOptions) -> anyhow::Result<AnalysisReport> {
    if !root.is_dir() {
        anyhow::bail!("build directory {} does not exist", root.display());
    }

    let mut bundles: Vec<SizeRecord> = Vec::new();
    let mut errors: Vec<AnalysisError> = Vec::new();
    let mut scanned: u64 = 0;

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_extension(path, &opts.extensions) {
            continue;
        }

        let name = relative_name(root, path);

        let len = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                errors.push(AnalysisError {
                    file_name: name,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if scanned.saturating_add(len) > opts.max_total_bytes_scanned {
            tracing::warn!(
                limit = opts.max_total_bytes_scanned,
                "scan limit reached, skipping remaining files"
            );
            break;
        }
        scanned += len;

        match measure_file(path, opts.gzip) {
            Ok(total_bytes) => {
                tracing::debug!(file = %name, total_bytes, "measured bundle");
                bundles.push(SizeRecord {
                    file_name: name,
                    total_bytes,
                });
            }
            Err(e) => errors.push(AnalysisError {
                file_name: name,
                message: format!("{e:#}"),
            }),
        }
    }

    Ok(AnalysisReport {
        bundles,
        errors,
        gzip: opts.gzip,
        root: root.display().to_string(),
    })
}

fn measure_file(path: &Path, gzip: bool) -> anyhow::Result<u64> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(f);
    measure(&mut reader, gzip).with_context(|| format!("measure {}", path.display()))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
