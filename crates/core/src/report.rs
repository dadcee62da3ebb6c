use std::io::Write;

use crate::{
    actions::ActionConsole,
    stats::{BundleStats, CategoryStats, Comparison},
};

pub const BANNER: &str = "✅ Bundle stats generated";

/// Console lines describing `stats`, in display order.
pub fn report_lines(stats: &BundleStats) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(BANNER.to_string());
    lines.push(format!("Total bundle size: {}", stats.total_bytes));
    lines.push(String::new());
    push_category(&mut lines, &stats.js_bundles_and_sizes);
    lines.push(String::new());
    push_category(&mut lines, &stats.css_bundles_and_sizes);
    lines
}

fn push_category(lines: &mut Vec<String>, category: &CategoryStats) {
    lines.push(format!("{} ({})", category.title, category.total_size));
    for log in &category.bundle_logs {
        lines.push(format!("  {log}"));
    }
}

/// Writes bundle stats to the job console.
pub struct Reporter<'a, W: Write> {
    console: &'a mut ActionConsole<W>,
}

impl<'a, W: Write> Reporter<'a, W> {
    pub fn new(console: &'a mut ActionConsole<W>) -> Self {
        Self { console }
    }

    pub fn report(&mut self, stats: &BundleStats) {
        for line in report_lines(stats) {
            self.console.info(&line);
        }
    }
}

pub fn comparison_line(cmp: &Comparison) -> String {
    format!("This pull request represents a change of {}", cmp.delta)
}

pub fn no_baseline_line(stats: &BundleStats) -> String {
    format!(
        "This build was {} - couldn't find a log to check against",
        stats.total_bytes
    )
}

/// Job summary document for `stats`, with the comparison when one was made.
pub fn to_markdown(stats: &BundleStats, comparison: Option<&Comparison>) -> String {
    let mut s = String::new();
    s.push_str("# Bundle size\n\n");
    s.push_str(&format!("- total: `{}`\n", stats.total_bytes));
    s.push_str(&format!("- total_bytes: `{}`\n", stats.total_bytes_number));
    s.push('\n');

    match comparison {
        Some(cmp) => {
            s.push_str("## Compared to target branch\n\n");
            s.push_str(&format!("- target_total_bytes: `{}`\n", cmp.target_total));
            s.push_str(&format!("- delta_bytes: `{}`\n", cmp.delta_bytes));
            s.push_str(&format!("- delta: `{}`\n", cmp.delta));
            s.push('\n');
        }
        None => {
            s.push_str("## Compared to target branch\n\n");
            s.push_str("- (no baseline)\n\n");
        }
    }

    for category in [&stats.js_bundles_and_sizes, &stats.css_bundles_and_sizes] {
        s.push_str(&format!("## {} ({})\n\n", category.title, category.total_size));
        if category.bundle_logs.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for log in &category.bundle_logs {
                s.push_str(&format!("- {log}\n"));
            }
        }
        s.push('\n');
    }

    s
}
