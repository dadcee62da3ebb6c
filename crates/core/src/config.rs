use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "bundlesize.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub path: Option<PathBuf>,
    pub artifact_dir: Option<PathBuf>,
    pub gzip: Option<bool>,
    pub max_total_bytes_scanned: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// `None` when there is no `bundlesize.toml` in the working directory.
    /// A file that exists but cannot be read or parsed is returned as an error.
    pub fn discover() -> Option<anyhow::Result<Self>> {
        Self::discover_in(Path::new("."))
    }

    pub fn discover_in(dir: &Path) -> Option<anyhow::Result<Self>> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Some(Config::load(&path))
        } else {
            None
        }
    }
}
