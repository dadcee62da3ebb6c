use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use bundlesize_core::actions::ActionConsole;
use bundlesize_core::config::{Config, CONFIG_FILE};
use bundlesize_core::event::ActionEnv;
use bundlesize_core::flow::DEFAULT_BUILD_PATH;
use bundlesize_core::report::report_lines;
use bundlesize_core::stats::{compare, BundleStats};
use bundlesize_core::types::AnalysisReport;
use bundlesize_core::{
    create_stats, run_action, AnalyzeOptions, BundleAnalyzer, DirArtifactStore, Flow, FsAnalyzer,
};

const DEFAULT_ARTIFACT_DIR: &str = ".bundle-size";

#[derive(Parser, Debug)]
#[command(
    name = "bundlesize",
    version,
    about = "Bundle size tracking for CI builds"
)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as a CI step: store stats on push, compare on pull requests
    Run {
        /// Event name, defaults to GITHUB_EVENT_NAME
        #[arg(long)]
        event: Option<String>,

        /// Full git ref, defaults to GITHUB_REF
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Target branch of a pull request, defaults to the event payload
        #[arg(long)]
        base_ref: Option<String>,

        #[arg(long)]
        path: Option<PathBuf>,

        #[arg(long)]
        artifact_dir: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        no_gzip: bool,
    },
    /// Measure a build directory and print the stats
    Analyze {
        #[arg(long)]
        path: Option<PathBuf>,

        /// Print the raw snapshot as JSON instead of the report
        #[arg(long)]
        json: bool,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        no_gzip: bool,
    },
    /// Compare two stored snapshots
    Compare {
        #[arg(long)]
        current: PathBuf,

        #[arg(long)]
        target: PathBuf,
    },
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

#[derive(Debug, Clone)]
struct Settings {
    build_path: PathBuf,
    artifact_dir: PathBuf,
    options: AnalyzeOptions,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let res = match cli.cmd {
        Commands::Run {
            event,
            git_ref,
            base_ref,
            path,
            artifact_dir,
            config,
            no_gzip,
        } => {
            let cfg = load_config(config.as_deref());
            let settings = resolve_settings(path, artifact_dir, no_gzip, &cfg);
            let env = resolve_action_env(event, git_ref, base_ref);
            run_ci(&env, &settings)
        }
        Commands::Analyze {
            path,
            json,
            config,
            no_gzip,
        } => {
            let cfg = load_config(config.as_deref());
            let settings = resolve_settings(path, None, no_gzip, &cfg);
            run_analyze(&settings, json)
        }
        Commands::Compare { current, target } => run_compare(&current, &target),
    };

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("bundlesize=debug,bundlesize_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bundlesize=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(path: Option<&Path>) -> Config {
    let (shown, res) = match path {
        Some(p) => (p.to_path_buf(), Config::load(p)),
        None => match Config::discover() {
            Some(res) => (PathBuf::from(CONFIG_FILE), res),
            None => return Config::default(),
        },
    };

    res.unwrap_or_else(|e| {
        eprintln!(
            "{}{}warning:{} failed to load config {}: {:#}",
            style().bold,
            style().yellow,
            style().reset,
            shown.display(),
            e
        );
        Config::default()
    })
}

fn env_input(name: &str) -> Option<String> {
    std::env::var(format!("INPUT_{name}"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_settings(
    path: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
    no_gzip: bool,
    cfg: &Config,
) -> Settings {
    let build_path = path
        .or_else(|| env_input("PATH").map(PathBuf::from))
        .or_else(|| cfg.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_PATH));
    let artifact_dir = artifact_dir
        .or_else(|| env_input("ARTIFACT_DIR").map(PathBuf::from))
        .or_else(|| cfg.artifact_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR));

    let defaults = AnalyzeOptions::default();
    let options = AnalyzeOptions {
        gzip: !no_gzip && cfg.gzip.unwrap_or(defaults.gzip),
        max_total_bytes_scanned: cfg
            .max_total_bytes_scanned
            .unwrap_or(defaults.max_total_bytes_scanned),
        ..defaults
    };

    Settings {
        build_path,
        artifact_dir,
        options,
    }
}

fn resolve_action_env(
    event: Option<String>,
    git_ref: Option<String>,
    base_ref: Option<String>,
) -> ActionEnv {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    ActionEnv {
        event_name: event.or_else(|| var("GITHUB_EVENT_NAME")),
        git_ref: git_ref.or_else(|| var("GITHUB_REF")),
        base_ref: base_ref.clone().or_else(|| var("GITHUB_BASE_REF")),
        // An explicit base ref wins over the payload.
        event_path: if base_ref.is_some() {
            None
        } else {
            var("GITHUB_EVENT_PATH").map(PathBuf::from)
        },
    }
}

fn run_ci(env: &ActionEnv, settings: &Settings) -> anyhow::Result<std::process::ExitCode> {
    tracing::debug!(?env, ?settings, "resolved action environment");

    let analyzer = FsAnalyzer;
    let store = DirArtifactStore::new(&settings.artifact_dir);
    let flow = Flow {
        analyzer: &analyzer,
        store: &store,
        build_path: settings.build_path.clone(),
        options: settings.options.clone(),
    };

    let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
    let mut console = ActionConsole::stdout()
        .with_output_file(var("GITHUB_OUTPUT"))
        .with_summary_file(var("GITHUB_STEP_SUMMARY"));

    let outcome = run_action(env, &flow, &mut console);
    tracing::debug!(?outcome, "flow finished");

    if outcome.is_failure() || console.failed() {
        Ok(std::process::ExitCode::from(1))
    } else {
        Ok(std::process::ExitCode::SUCCESS)
    }
}

fn print_stats(stats: &BundleStats) {
    let s = style();
    for line in report_lines(stats) {
        if line.starts_with("  ") {
            eprintln!("  {dim}{line}{reset}", dim = s.dim, reset = s.reset);
        } else {
            eprintln!("  {bold}{line}{reset}", bold = s.bold, reset = s.reset);
        }
    }
    eprintln!();
}

fn run_analyze(settings: &Settings, json: bool) -> anyhow::Result<std::process::ExitCode> {
    let report = FsAnalyzer
        .analyze(&settings.build_path, &settings.options)
        .with_context(|| format!("analyze {}", settings.build_path.display()))?;

    if json {
        let bytes = report.to_json()?;
        println!("{}", String::from_utf8_lossy(&bytes));
        return Ok(std::process::ExitCode::SUCCESS);
    }

    for err in &report.errors {
        eprintln!(
            "{}{}warning:{} {}: {}",
            style().bold,
            style().yellow,
            style().reset,
            err.file_name,
            err.message
        );
    }

    let stats = create_stats(&report.bundles);

    // Machine-parseable line on stdout
    println!(
        "total_bytes={} js_bytes={} css_bytes={}",
        stats.total_bytes_number,
        stats.js_bundles_and_sizes.total_bytes,
        stats.css_bundles_and_sizes.total_bytes
    );

    if report.is_empty() {
        anyhow::bail!(
            "no bundles found under {}, or the build wasn't found",
            settings.build_path.display()
        );
    }

    print_stats(&stats);
    Ok(std::process::ExitCode::SUCCESS)
}

fn load_snapshot(path: &Path) -> anyhow::Result<BundleStats> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let report =
        AnalysisReport::from_json(&bytes).with_context(|| format!("load {}", path.display()))?;
    Ok(create_stats(&report.bundles))
}

fn delta_color(delta_bytes: i64) -> &'static str {
    let s = style();
    if delta_bytes > 0 {
        s.red
    } else if delta_bytes < 0 {
        s.green
    } else {
        s.dim
    }
}

fn commas(n: u64) -> String {
    let s = n.to_string();
    let bytes = s.as_bytes();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(b as char);
    }
    result
}

fn run_compare(current: &Path, target: &Path) -> anyhow::Result<std::process::ExitCode> {
    let s = style();
    let current = load_snapshot(current)?;
    let target = load_snapshot(target)?;
    let cmp = compare(&current, &target);

    println!("delta_bytes={} delta={}", cmp.delta_bytes, cmp.delta);

    eprintln!(
        "  {dim}current {reset}{bold}{}{reset} {dim}({} bytes){reset}",
        current.total_bytes,
        commas(cmp.current_total),
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}target  {reset}{bold}{}{reset} {dim}({} bytes){reset}",
        target.total_bytes,
        commas(cmp.target_total),
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}delta   {reset}{dc}{bold}{}{reset}",
        cmp.delta,
        dim = s.dim,
        dc = delta_color(cmp.delta_bytes),
        bold = s.bold,
        reset = s.reset
    );
    eprintln!();

    Ok(std::process::ExitCode::SUCCESS)
}
