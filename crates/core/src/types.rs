use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Size of one emitted bundle file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SizeRecord {
    #[serde(rename = "bundleName", alias = "fileName")]
    pub file_name: String,
    pub total_bytes: u64,
}

impl SizeRecord {
    pub fn new(file_name: impl Into<String>, total_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            total_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisError {
    #[serde(rename = "bundleName", alias = "fileName")]
    pub file_name: String,
    pub message: String,
}

/// Output of one analyzer run. This is also the document persisted as a
/// branch artifact and read back for comparisons.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub bundles: Vec<SizeRecord>,
    #[serde(default)]
    pub errors: Vec<AnalysisError>,
    #[serde(default)]
    pub gzip: bool,
    #[serde(default)]
    pub root: String,
}

impl AnalysisReport {
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("parse bundle snapshot json")
    }

    pub fn to_json(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("serialize bundle snapshot json")
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
