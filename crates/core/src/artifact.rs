use std::path::{Path, PathBuf};

use anyhow::Context;

/// Stores one artifact per key. Keys are branch names.
pub trait ArtifactStore {
    /// Store `bytes` under `key`, replacing any previous artifact.
    fn put_artifact(&self, key: &str, bytes: &[u8]) -> anyhow::Result<()>;

    /// `Ok(None)` when nothing was ever stored under `key`.
    fn get_artifact(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// File name of the bundle snapshot stored for `branch`.
///
/// `%` and `/` are percent-encoded, so distinct branch names never share a
/// file and nested names stay one file in the artifact directory.
pub fn artifact_file_name(branch: &str) -> String {
    format!(
        "{}-react-bundle-logs.json",
        branch.replace('%', "%25").replace('/', "%2F")
    )
}

/// Keeps artifacts as files in a single directory.
#[derive(Debug, Clone)]
pub struct DirArtifactStore {
    dir: PathBuf,
}

impl DirArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(artifact_file_name(key))
    }
}

impl ArtifactStore for DirArtifactStore {
    fn put_artifact(&self, key: &str, bytes: &[u8]) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create artifact dir {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(key, path = %path.display(), "stored artifact");
        Ok(())
    }

    fn get_artifact(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, path = %path.display(), "no artifact stored");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }
}
