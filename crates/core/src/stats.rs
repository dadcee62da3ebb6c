use serde::{Deserialize, Serialize};

use crate::{
    format::{clamp_to_i64, format_delta, format_si},
    types::SizeRecord,
};

pub const JS_TITLE: &str = "Javascript Bundles";
pub const CSS_TITLE: &str = "CSS Bundles";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryStats {
    pub title: String,
    pub total_size: String,
    pub total_bytes: u64,
    /// One `"<name> (<size>)"` line per matching bundle, in input order.
    pub bundle_logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleStats {
    pub total_bytes: String,
    pub total_bytes_number: u64,
    pub js_bundles_and_sizes: CategoryStats,
    pub css_bundles_and_sizes: CategoryStats,
}

impl BundleStats {
    /// Bytes from records that belong to neither category.
    pub fn uncategorized_bytes(&self) -> u64 {
        self.total_bytes_number
            .saturating_sub(self.js_bundles_and_sizes.total_bytes)
            .saturating_sub(self.css_bundles_and_sizes.total_bytes)
    }
}

pub fn create_stats(records: &[SizeRecord]) -> BundleStats {
    let total = records
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.total_bytes));

    BundleStats {
        total_bytes: format_si(total),
        total_bytes_number: total,
        js_bundles_and_sizes: category_stats(records, ".js", JS_TITLE),
        css_bundles_and_sizes: category_stats(records, ".css", CSS_TITLE),
    }
}

fn category_stats(records: &[SizeRecord], extension: &str, title: &str) -> CategoryStats {
    let mut total_bytes: u64 = 0;
    let mut bundle_logs = Vec::new();

    for r in records.iter().filter(|r| r.file_name.ends_with(extension)) {
        total_bytes = total_bytes.saturating_add(r.total_bytes);
        bundle_logs.push(format!(
            "{} ({})",
            display_name(&r.file_name),
            format_si(r.total_bytes)
        ));
    }

    CategoryStats {
        title: title.to_string(),
        total_size: format_si(total_bytes),
        total_bytes,
        bundle_logs,
    }
}

fn display_name(file_name: &str) -> &str {
    file_name.rsplit('/').next().unwrap_or(file_name)
}

/// Difference between the current build and the target branch's build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comparison {
    pub current_total: u64,
    pub target_total: u64,
    pub delta_bytes: i64,
    pub delta: String,
}

pub fn compare(current: &BundleStats, target: &BundleStats) -> Comparison {
    let delta_bytes = clamp_to_i64(current.total_bytes_number)
        .saturating_sub(clamp_to_i64(target.total_bytes_number));

    Comparison {
        current_total: current.total_bytes_number,
        target_total: target.total_bytes_number,
        delta_bytes,
        delta: format_delta(delta_bytes),
    }
}
